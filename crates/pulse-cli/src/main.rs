//! Pulse — weekly product review pulse runner.

use std::sync::Arc;

use anyhow::Context;
use pulse_classify::ThemeClassifier;
use pulse_core::PulseConfig;
use pulse_runtime::{
    block_on_bounded, FileSink, JsonFileSource, Pipeline, ReportDelivery, ReportSink,
    ReviewQuery, ReviewSource, SampleSource, SHUTDOWN_GRACE,
};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Command, RunArgs};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    match command {
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
        Command::ValidateTaxonomy { config } => {
            let config = PulseConfig::load(config.as_deref())?;
            let taxonomy = config.load_taxonomy()?;
            println!(
                "Taxonomy OK: {} themes, default '{}'",
                taxonomy.len(),
                taxonomy.default_theme()
            );
            for theme in taxonomy.themes() {
                println!("  {} ({} keywords)", theme.name, theme.keywords.len());
            }
            Ok(())
        }
        Command::Run(run_args) => block_on_bounded(run(run_args), SHUTDOWN_GRACE)?,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let review_file = args.review_file().cloned();
    let mut config = PulseConfig::load(args.config.as_deref())?;
    if let Some(weeks) = args.weeks {
        config.review_weeks = weeks;
    }
    if let Some(max) = args.max_reviews {
        config.max_reviews = max;
    }
    if let Some(dir) = args.output {
        config.output_dir = dir;
    }
    config.validate()?;

    // The taxonomy must be valid before anything runs
    let taxonomy = Arc::new(config.load_taxonomy().context("Invalid theme taxonomy")?);
    let scorer = pulse_infer::create_scorer(config.model_dir.as_deref());
    let classifier = ThemeClassifier::new(taxonomy, scorer, config.scorer_timeout())?;
    let pipeline = Pipeline::new(Arc::new(classifier), config.max_concurrency);

    let today = chrono::Local::now().date_naive();
    let query = ReviewQuery::trailing_weeks(today, config.review_weeks, config.max_reviews)?;
    let source: Box<dyn ReviewSource> = match review_file {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(SampleSource),
    };

    info!(
        "Fetching up to {} reviews from {} ({} to {})",
        query.max_reviews,
        source.name(),
        query.since,
        query.until
    );
    let raw = source.fetch(&query)?;
    if raw.is_empty() {
        warn!("No reviews found for {} to {}", query.since, query.until);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            let _ = shutdown_tx.send(true);
        }
    });

    let outcome = pipeline.run(raw, shutdown_rx).await?;
    for stat in &outcome.stats {
        info!("  {}: {} ({:.2}%)", stat.theme, stat.count, stat.percentage);
    }

    let sink = FileSink::new(&config.output_dir, &config.email_recipient, &config.email_sender);
    let rows = outcome.rows();
    sink.deliver(&ReportDelivery {
        rendered: &outcome.rendered,
        rows: &rows,
        run_date: today,
    })?;

    println!("{}", outcome.rendered);
    info!(
        "Weekly pulse saved to {}",
        sink.report_path(today).display()
    );
    Ok(())
}
