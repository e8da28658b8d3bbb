//! Pulse Report — theme statistics and the weekly digest.
//!
//! Aggregation ranks themes by volume; synthesis picks the top three,
//! one quote each and canned action ideas, bounded to three entries per
//! section; rendering produces the fixed markdown layout consumed by
//! downstream dashboards.

pub mod aggregate;
pub mod render;
pub mod synthesize;

pub use aggregate::{aggregate, top_n};
pub use render::{parse_report, render, ParsedReport, EMPTY_REPORT};
pub use synthesize::{action_ideas, build_quote, synthesize, Sentiment, MAX_ENTRIES};
