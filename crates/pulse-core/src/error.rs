//! Error types for the review pulse pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Taxonomy error: {0}")]
    Taxonomy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Review source error: {0}")]
    Source(String),

    #[error("Report sink error: {0}")]
    Sink(String),

    #[error("Run cancelled before the batch completed")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
