//! Pulse Classify — assigns each review exactly one theme from the taxonomy.
//!
//! The semantic scorer is tried first when one is loaded; any error, timeout
//! or malformed score vector falls back to deterministic keyword matching,
//! and a review matching nothing gets the taxonomy's default theme.

pub mod classifier;
pub mod keyword;

pub use classifier::ThemeClassifier;
pub use keyword::{KeywordMatcher, KeywordScore, ThemeDecision, DEFAULT_RATIONALE};
