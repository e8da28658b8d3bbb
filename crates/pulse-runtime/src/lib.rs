//! Pulse Runtime — batch orchestration and the I/O boundary.
//!
//! Sequences normalize → classify → aggregate → synthesize over one batch
//! of reviews, and defines the review-source and report-sink interfaces
//! with file-backed adapters.

pub mod executor;
pub mod orchestrator;
pub mod sink;
pub mod source;
pub mod types;

pub use executor::{block_on_bounded, SHUTDOWN_GRACE};
pub use orchestrator::Pipeline;
pub use sink::{FileSink, ReportDelivery, ReportSink};
pub use source::{JsonFileSource, ReviewQuery, ReviewSource, SampleSource};
pub use types::*;
