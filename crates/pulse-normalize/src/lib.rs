//! Text normalization — PII redaction and whitespace cleanup for review text.
//!
//! Email addresses, long digit runs (phone numbers) and http(s) URLs are
//! replaced by fixed placeholders before any review text is classified,
//! quoted or handed to a sink.

pub mod pii;

pub use pii::{normalize, normalize_opt, PiiDetector, PiiEntity, PiiType, RedactionResult};
