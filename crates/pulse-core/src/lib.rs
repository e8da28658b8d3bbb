//! Pulse Core — shared data model, theme taxonomy, configuration, errors.

pub mod config;
pub mod error;
pub mod taxonomy;
pub mod types;

pub use config::PulseConfig;
pub use error::{Error, Result};
pub use taxonomy::{Theme, ThemeTaxonomy};
pub use types::*;
