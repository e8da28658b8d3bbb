//! Pipeline configuration.
//!
//! Values come from an optional JSON file, then environment overrides,
//! then built-in defaults for anything still unset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::taxonomy::ThemeTaxonomy;

/// Top-level pulse configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Directory receiving the report, table and email draft.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Trailing window of reviews to fetch, in weeks.
    #[serde(default = "default_review_weeks")]
    pub review_weeks: u32,
    /// Maximum number of reviews per batch.
    #[serde(default = "default_max_reviews")]
    pub max_reviews: usize,
    /// Upper bound on a single semantic scorer call.
    #[serde(default = "default_scorer_timeout_ms")]
    pub scorer_timeout_ms: u64,
    /// Reviews classified concurrently.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
    /// Directory holding `model.onnx` + `tokenizer.json` for the semantic scorer.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    /// Taxonomy JSON file; the built-in taxonomy is used when unset.
    #[serde(default)]
    pub taxonomy_path: Option<PathBuf>,
    #[serde(default = "default_recipient")]
    pub email_recipient: String,
    #[serde(default = "default_sender")]
    pub email_sender: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_review_weeks() -> u32 {
    1
}
fn default_max_reviews() -> usize {
    100
}
fn default_scorer_timeout_ms() -> u64 {
    5000
}
fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
fn default_recipient() -> String {
    "product-team@example.com".into()
}
fn default_sender() -> String {
    "weekly-pulse@example.com".into()
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            review_weeks: default_review_weeks(),
            max_reviews: default_max_reviews(),
            scorer_timeout_ms: default_scorer_timeout_ms(),
            max_concurrency: default_concurrency(),
            model_dir: None,
            taxonomy_path: None,
            email_recipient: default_recipient(),
            email_sender: default_sender(),
        }
    }
}

impl PulseConfig {
    /// Load config from an optional file, then apply environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                let config: PulseConfig = serde_json::from_str(&json)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PULSE_*` overrides from the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PULSE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PULSE_REVIEW_WEEKS") {
            self.review_weeks = parse_env("PULSE_REVIEW_WEEKS", &v)?;
        }
        if let Some(v) = lookup("PULSE_MAX_REVIEWS") {
            self.max_reviews = parse_env("PULSE_MAX_REVIEWS", &v)?;
        }
        if let Some(v) = lookup("PULSE_SCORER_TIMEOUT_MS") {
            self.scorer_timeout_ms = parse_env("PULSE_SCORER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("PULSE_CONCURRENCY") {
            self.max_concurrency = parse_env("PULSE_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("PULSE_MODEL_DIR") {
            self.model_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PULSE_TAXONOMY") {
            self.taxonomy_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PULSE_EMAIL_RECIPIENT") {
            self.email_recipient = v;
        }
        if let Some(v) = lookup("PULSE_EMAIL_SENDER") {
            self.email_sender = v;
        }
        Ok(())
    }

    /// Repair or reject unusable settings.
    pub fn validate(&mut self) -> Result<()> {
        if self.max_concurrency == 0 {
            warn!("max_concurrency of 0 is not usable, using 1");
            self.max_concurrency = 1;
        }
        if self.review_weeks == 0 {
            return Err(Error::Config("review_weeks must be at least 1".into()));
        }
        Ok(())
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }

    /// Load the configured taxonomy, or the built-in one.
    ///
    /// Any inconsistency is returned as an error; callers must not start
    /// the pipeline without a valid taxonomy.
    pub fn load_taxonomy(&self) -> Result<ThemeTaxonomy> {
        match &self.taxonomy_path {
            Some(path) => ThemeTaxonomy::load(path),
            None => Ok(ThemeTaxonomy::builtin()),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {}: {}", key, value)))
}
