//! Pulse Infer — semantic scoring of review text against theme labels.
//!
//! Provides the `LabelScorer` trait used by the classifier's primary path.
//! When the `onnx` feature is enabled and model files are present,
//! `EmbeddingScorer` over `OnnxEmbedder` scores labels by embedding
//! similarity. Without it, `NoopScorer` is used and classification falls
//! back to keyword matching.

pub mod cache;
pub mod embedder;
pub mod onnx_embedder;
pub mod scorer;

pub use cache::QueryCache;
pub use embedder::{EmbedderBackend, EmbeddingResult};
pub use scorer::{EmbeddingScorer, LabelScorer, NoopScorer};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Create the best available label scorer for the given model directory.
///
/// Tries the ONNX embedder first (if feature enabled and model files
/// present), falls back to NoopScorer.
pub fn create_scorer(model_dir: Option<&Path>) -> Arc<dyn LabelScorer> {
    #[cfg(feature = "onnx")]
    {
        if let Some(dir) = model_dir {
            match OnnxEmbedder::load(dir) {
                Ok(embedder) => {
                    tracing::info!("Using ONNX semantic scorer (dim={})", embedder.dimension());
                    return Arc::new(EmbeddingScorer::new(Arc::new(embedder)));
                }
                Err(e) => {
                    tracing::warn!("ONNX embedder unavailable: {}. Falling back to keywords.", e);
                }
            }
        } else {
            tracing::info!("No model directory configured. Using keyword classification.");
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = model_dir;
        tracing::info!("ONNX feature disabled. Using keyword classification.");
    }

    Arc::new(NoopScorer)
}
