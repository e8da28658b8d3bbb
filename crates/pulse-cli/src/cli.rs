//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};

pub const USAGE: &str = "\
Weekly review pulse

Usage: pulse [command] [options]

Commands:
  run (default)            Fetch reviews, classify them and write the weekly report
  validate-taxonomy        Check the configured theme taxonomy and exit
  help                     Show this help message

Options:
  --input <file>           Read reviews from a JSON file
  --sample                 Use built-in sample reviews; same as omitting --input
  --weeks <n>              Trailing window in weeks
  --max-reviews <n>        Maximum reviews per run
  --output <dir>           Output directory
  --config <file>          JSON configuration file";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub input: Option<PathBuf>,
    /// Explicit request for sample reviews. Sample reviews are also used
    /// when no input file is given; the flag only forbids `--input`.
    pub sample: bool,
    pub weeks: Option<u32>,
    pub max_reviews: Option<usize>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Review file to read, or `None` for the built-in sample reviews.
    pub fn review_file(&self) -> Option<&PathBuf> {
        if self.sample {
            None
        } else {
            self.input.as_ref()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    ValidateTaxonomy { config: Option<PathBuf> },
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse(args: &[String]) -> anyhow::Result<Command> {
    let (command, rest) = match args.first().map(String::as_str) {
        Some("run") => ("run", &args[1..]),
        Some("validate-taxonomy") => ("validate-taxonomy", &args[1..]),
        Some("help" | "--help" | "-h") => return Ok(Command::Help),
        Some(flag) if flag.starts_with("--") => ("run", args),
        None => ("run", args),
        Some(other) => bail!("Unknown command: {}. Use 'pulse help' for usage.", other),
    };

    let mut run = RunArgs::default();
    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", flag))
        };
        match flag.as_str() {
            "--config" => run.config = Some(PathBuf::from(value()?)),
            "--input" if command == "run" => run.input = Some(PathBuf::from(value()?)),
            "--sample" if command == "run" => run.sample = true,
            "--weeks" if command == "run" => {
                let v = value()?;
                run.weeks = Some(v.parse().with_context(|| format!("invalid --weeks: {}", v))?);
            }
            "--max-reviews" if command == "run" => {
                let v = value()?;
                run.max_reviews =
                    Some(v.parse().with_context(|| format!("invalid --max-reviews: {}", v))?);
            }
            "--output" if command == "run" => run.output = Some(PathBuf::from(value()?)),
            other => bail!("Unexpected argument for '{}': {}", command, other),
        }
    }

    if command == "validate-taxonomy" {
        return Ok(Command::ValidateTaxonomy { config: run.config });
    }
    if run.sample && run.input.is_some() {
        bail!("--input and --sample are mutually exclusive");
    }
    Ok(Command::Run(run))
}
