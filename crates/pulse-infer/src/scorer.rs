//! Label scoring strategies for the classifier's semantic path.
//!
//! A `LabelScorer` maps review text to one score per candidate theme, in
//! candidate order, each in [0, 1]. Implementations:
//! - `EmbeddingScorer`: cosine similarity between text and label embeddings,
//!   softmax-normalized over the candidates
//! - `NoopScorer`: always unavailable, forcing the keyword fallback

use std::sync::Arc;

use ndarray::Array1;
use pulse_core::{Error, Result, Theme};

use crate::cache::QueryCache;
use crate::embedder::EmbedderBackend;

/// Strategy for scoring text against candidate theme labels.
pub trait LabelScorer: Send + Sync {
    /// Score `text` against `labels`. The result has one entry per label.
    fn score(&self, text: &str, labels: &[Theme]) -> Result<Vec<f32>>;

    /// Whether the scorer is backed by a loaded model.
    fn is_available(&self) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Placeholder scorer used when no semantic model is present.
pub struct NoopScorer;

impl LabelScorer for NoopScorer {
    fn score(&self, _text: &str, _labels: &[Theme]) -> Result<Vec<f32>> {
        Err(Error::Inference("no semantic scorer loaded".into()))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Softmax temperature applied to cosine similarities.
const SOFTMAX_TEMPERATURE: f32 = 0.05;

/// Embedding-similarity scorer.
pub struct EmbeddingScorer {
    embedder: Arc<dyn EmbedderBackend>,
    label_cache: QueryCache,
}

impl EmbeddingScorer {
    pub fn new(embedder: Arc<dyn EmbedderBackend>) -> Self {
        Self {
            embedder,
            label_cache: QueryCache::default_cache(),
        }
    }

    /// Text embedded for a label: its name plus description when present.
    fn label_text(theme: &Theme) -> String {
        if theme.description.is_empty() {
            theme.name.clone()
        } else {
            format!("{}: {}", theme.name, theme.description)
        }
    }

    fn label_embedding(&self, theme: &Theme) -> Result<Array1<f32>> {
        let text = Self::label_text(theme);
        if let Some(cached) = self.label_cache.get(&text) {
            return Ok(cached);
        }
        let embedding = self
            .embedder
            .embed(&text)
            .ok_or_else(|| Error::Inference(format!("failed to embed label '{}'", theme.name)))?
            .embedding;
        self.label_cache.put(text, embedding.clone());
        Ok(embedding)
    }
}

impl LabelScorer for EmbeddingScorer {
    fn score(&self, text: &str, labels: &[Theme]) -> Result<Vec<f32>> {
        if labels.is_empty() {
            return Err(Error::Inference("no candidate labels".into()));
        }
        if text.trim().is_empty() {
            return Err(Error::Inference("empty text".into()));
        }

        let text_emb = self
            .embedder
            .embed(text)
            .ok_or_else(|| Error::Inference("failed to embed review text".into()))?
            .embedding;

        let mut similarities = Vec::with_capacity(labels.len());
        for label in labels {
            let label_emb = self.label_embedding(label)?;
            similarities.push(cosine_similarity(&text_emb, &label_emb));
        }

        Ok(softmax(&Array1::from_vec(similarities), SOFTMAX_TEMPERATURE).to_vec())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "embedding"
    }
}

fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a < 1e-9 || norm_b < 1e-9 {
        return 0.0;
    }
    a.dot(b) / (norm_a * norm_b)
}

fn softmax(values: &Array1<f32>, temperature: f32) -> Array1<f32> {
    let t = temperature.max(1e-6);
    let max = values.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exps = values.mapv(|v| ((v - max) / t).exp());
    let sum = exps.sum();
    exps / sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmbeddingResult;

    /// Bag-of-words embedder over a tiny fixed vocabulary.
    struct VocabEmbedder {
        vocab: Vec<&'static str>,
    }

    impl EmbedderBackend for VocabEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            let lower = text.to_lowercase();
            let embedding = Array1::from_iter(
                self.vocab
                    .iter()
                    .map(|w| lower.matches(w).count() as f32),
            );
            Some(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.vocab.len()
        }
    }

    fn labels() -> Vec<Theme> {
        vec![
            Theme::new("Payments", "upi bank transfer", &[]),
            Theme::new("Crashes", "crash freeze", &[]),
        ]
    }

    #[test]
    fn test_noop_unavailable() {
        let scorer = NoopScorer;
        assert!(!scorer.is_available());
        assert!(scorer.score("anything", &labels()).is_err());
    }

    #[test]
    fn test_embedding_scorer_picks_similar_label() {
        let embedder = Arc::new(VocabEmbedder {
            vocab: vec!["upi", "bank", "crash", "freeze"],
        });
        let scorer = EmbeddingScorer::new(embedder);
        let scores = scorer
            .score("the app would crash and freeze", &labels())
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
        let total: f32 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_label_embeddings_cached() {
        let embedder = Arc::new(VocabEmbedder {
            vocab: vec!["upi", "bank", "crash", "freeze"],
        });
        let scorer = EmbeddingScorer::new(embedder);
        scorer.score("upi failed", &labels()).unwrap();
        scorer.score("bank failed", &labels()).unwrap();
        assert_eq!(scorer.label_cache.len(), 2);
    }

    #[test]
    fn test_embedding_scorer_rejects_empty_text() {
        let embedder = Arc::new(VocabEmbedder { vocab: vec!["upi"] });
        let scorer = EmbeddingScorer::new(embedder);
        assert!(scorer.score("   ", &labels()).is_err());
    }

    #[test]
    fn test_softmax_uniform_on_equal_inputs() {
        let out = softmax(&Array1::from_vec(vec![0.3, 0.3, 0.3]), 0.05);
        for v in out.iter() {
            assert!((v - 1.0 / 3.0).abs() < 1e-5);
        }
    }
}
