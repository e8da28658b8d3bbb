//! Runtime types.

use pulse_core::{ClassifiedReview, ClassifiedRow, PulseReport, ThemeStat};
use serde::Serialize;

/// Everything produced by one completed batch.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Classified reviews, in input order.
    pub reviews: Vec<ClassifiedReview>,
    /// Per-theme statistics, in taxonomy order.
    pub stats: Vec<ThemeStat>,
    pub report: PulseReport,
    /// `report` in the fixed text layout.
    pub rendered: String,
    /// Raw reviews dropped during normalization (no usable date).
    #[serde(rename = "skippedReviews")]
    pub skipped: usize,
    /// Reviews classified without the semantic scorer while one was loaded.
    #[serde(rename = "degradedReviews")]
    pub degraded: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl PipelineOutcome {
    /// Classified-review table rows for report sinks.
    pub fn rows(&self) -> Vec<ClassifiedRow> {
        self.reviews.iter().map(ClassifiedRow::from).collect()
    }
}
