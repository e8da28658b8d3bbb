//! Theme classifier — semantic scorer first, keyword matching as fallback.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{ClassificationMethod, Error, Result, ThemeTaxonomy};
use pulse_infer::LabelScorer;
use tracing::{debug, warn};

use crate::keyword::{KeywordMatcher, ThemeDecision};

/// Classifies reviews against a fixed taxonomy.
pub struct ThemeClassifier {
    taxonomy: Arc<ThemeTaxonomy>,
    keywords: KeywordMatcher,
    scorer: Arc<dyn LabelScorer>,
    timeout: Duration,
}

impl ThemeClassifier {
    /// Build a classifier. `timeout` bounds each semantic scorer call.
    pub fn new(
        taxonomy: Arc<ThemeTaxonomy>,
        scorer: Arc<dyn LabelScorer>,
        timeout: Duration,
    ) -> Result<Self> {
        let keywords = KeywordMatcher::new(&taxonomy)?;
        Ok(Self {
            taxonomy,
            keywords,
            scorer,
            timeout,
        })
    }

    /// Keyword-only classifier, for callers without a semantic model.
    pub fn keyword_only(taxonomy: Arc<ThemeTaxonomy>) -> Result<Self> {
        Self::new(taxonomy, Arc::new(pulse_infer::NoopScorer), Duration::ZERO)
    }

    pub fn taxonomy(&self) -> &Arc<ThemeTaxonomy> {
        &self.taxonomy
    }

    /// Whether the semantic path will be attempted.
    pub fn has_semantic(&self) -> bool {
        self.scorer.is_available()
    }

    /// Deterministic keyword classification.
    pub fn keyword(&self, title: &str, body: &str) -> ThemeDecision {
        self.keywords.classify(title, body, &self.taxonomy)
    }

    /// Semantic classification: argmax over the scorer's per-theme scores.
    ///
    /// Fails if the scorer fails or returns a vector that is the wrong
    /// length or has values outside [0, 1].
    pub fn semantic(&self, title: &str, body: &str) -> Result<ThemeDecision> {
        let text = combined_text(title, body);
        let themes = self.taxonomy.themes();
        let scores = self.scorer.score(&text, themes)?;

        if scores.len() != themes.len() {
            return Err(Error::Inference(format!(
                "scorer returned {} scores for {} themes",
                scores.len(),
                themes.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !(0.0..=1.0).contains(*s)) {
            return Err(Error::Inference(format!("score out of range: {}", bad)));
        }

        // Stable argmax: earliest declared theme wins ties.
        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }

        let confidence = f64::from(scores[best]);
        Ok(ThemeDecision {
            theme: themes[best].name.clone(),
            confidence,
            rationale: format!("Semantic classification confidence: {:.2}", confidence),
            method: ClassificationMethod::Semantic,
            degraded: false,
        })
    }

    /// Classify synchronously, without a time bound on the scorer.
    pub fn classify(&self, title: &str, body: &str) -> ThemeDecision {
        if combined_text(title, body).is_empty() {
            return ThemeDecision::default_for(&self.taxonomy);
        }
        if self.scorer.is_available() {
            match self.semantic(title, body) {
                Ok(decision) => return decision,
                Err(e) => {
                    warn!("Semantic scorer '{}' failed, using keywords: {}", self.scorer.name(), e);
                    return self.keyword(title, body).into_degraded();
                }
            }
        }
        self.keyword(title, body)
    }

    /// Classify with the semantic call bounded by the configured timeout.
    ///
    /// The scorer runs on the blocking pool; on timeout its result is
    /// discarded and the keyword path answers instead. Never fails.
    pub async fn classify_bounded(self: Arc<Self>, title: String, body: String) -> ThemeDecision {
        if combined_text(&title, &body).is_empty() {
            return ThemeDecision::default_for(&self.taxonomy);
        }
        if !self.scorer.is_available() {
            return self.keyword(&title, &body);
        }

        let worker = Arc::clone(&self);
        let (t, b) = (title.clone(), body.clone());
        let task = tokio::task::spawn_blocking(move || worker.semantic(&t, &b));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(decision))) => {
                debug!("Semantic decision: {} ({:.2})", decision.theme, decision.confidence);
                return decision;
            }
            Ok(Ok(Err(e))) => {
                warn!("Semantic scorer '{}' failed, using keywords: {}", self.scorer.name(), e);
            }
            Ok(Err(e)) => {
                warn!("Semantic scorer task panicked, using keywords: {}", e);
            }
            Err(_) => {
                warn!(
                    "Semantic scorer '{}' timed out after {:?}, using keywords",
                    self.scorer.name(),
                    self.timeout
                );
            }
        }
        self.keyword(&title, &body).into_degraded()
    }
}

fn combined_text(title: &str, body: &str) -> String {
    format!("{} {}", title, body).trim().to_string()
}
