//! Embedding engine trait.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation so the
//! semantic scorer can run over the ONNX model or a test double.

use ndarray::Array1;

/// Result of an embedding operation.
pub struct EmbeddingResult {
    /// Float32 embedding vector (384-dim for all-MiniLM-L6-v2).
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Trait for embedding backends.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    /// Returns None if the embedder is not available.
    fn embed(&self, text: &str) -> Option<EmbeddingResult>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}
