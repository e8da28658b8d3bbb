//! Orchestrator — runs one batch through normalize → classify → aggregate
//! → synthesize.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use pulse_classify::{ThemeClassifier, ThemeDecision};
use pulse_core::{
    Classification, ClassificationMethod, ClassifiedReview, Error, RawReview, Result, Review,
    ThemeTaxonomy,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::types::PipelineOutcome;

/// Batch pipeline over a fixed taxonomy and classifier.
pub struct Pipeline {
    classifier: Arc<ThemeClassifier>,
    max_concurrency: usize,
}

impl Pipeline {
    pub fn new(classifier: Arc<ThemeClassifier>, max_concurrency: usize) -> Self {
        Self {
            classifier,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn taxonomy(&self) -> &ThemeTaxonomy {
        self.classifier.taxonomy()
    }

    /// Normalize one raw review. Reviews without a date are rejected.
    pub fn normalize_review(raw: RawReview) -> Option<Review> {
        let date = raw.date?;
        let normalized_title = pulse_normalize::normalize_opt(raw.title.as_deref());
        let normalized_body = pulse_normalize::normalize_opt(raw.body.as_deref());
        Some(Review {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            body: raw.body.unwrap_or_default(),
            normalized_title,
            normalized_body,
            rating: raw.rating.clamp(1, 5),
            date,
        })
    }

    /// Run the full pipeline over one batch.
    ///
    /// Completes or fails as a unit: once `shutdown` flips to `true` the
    /// run stops and partial results are discarded.
    pub async fn run(
        &self,
        raw: Vec<RawReview>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineOutcome> {
        let start = Instant::now();
        if *shutdown.borrow() {
            return Err(Error::Cancelled);
        }

        let received = raw.len();
        let reviews: Vec<Review> = raw.into_iter().filter_map(Self::normalize_review).collect();
        let skipped = received - reviews.len();
        if skipped > 0 {
            warn!("Skipped {} reviews without a usable date", skipped);
        }
        info!(
            "Normalized {} reviews (semantic scorer: {})",
            reviews.len(),
            self.classifier.has_semantic()
        );

        let decisions = tokio::select! {
            decisions = self.classify_all(&reviews) => decisions,
            _ = cancelled(shutdown) => {
                warn!("Run cancelled during classification, discarding partial results");
                return Err(Error::Cancelled);
            }
        };

        let mut degraded = 0;
        let classified: Vec<ClassifiedReview> = reviews
            .into_iter()
            .zip(decisions)
            .map(|(review, decision)| {
                if decision.degraded {
                    degraded += 1;
                }
                let classification = decision.into_classification(&review.id);
                ClassifiedReview {
                    review,
                    classification,
                }
            })
            .collect();
        if degraded > 0 {
            warn!(
                "{} of {} reviews classified without the semantic scorer",
                degraded,
                classified.len()
            );
        }

        let classifications: Vec<Classification> =
            classified.iter().map(|c| c.classification.clone()).collect();
        let stats = pulse_report::aggregate(&classifications, self.taxonomy());
        let report = pulse_report::synthesize(&classified, self.taxonomy());
        let rendered = pulse_report::render(&report);

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Pipeline complete: {} reviews, {} themes reported ({}ms)",
            classified.len(),
            report.themes.len(),
            duration_ms
        );

        Ok(PipelineOutcome {
            reviews: classified,
            stats,
            report,
            rendered,
            skipped,
            degraded,
            duration_ms,
        })
    }

    /// Classify every review with bounded concurrency; output is in input order.
    async fn classify_all(&self, reviews: &[Review]) -> Vec<ThemeDecision> {
        let jobs = reviews.iter().enumerate().map(|(index, review)| {
            let classifier = Arc::clone(&self.classifier);
            let title = review.normalized_title.clone();
            let body = review.normalized_body.clone();
            let id = review.id.clone();
            async move {
                let mut fallback = ThemeDecision::default_for(classifier.taxonomy());
                if classifier.has_semantic() {
                    fallback = fallback.into_degraded();
                }
                let decision = match tokio::spawn(classifier.classify_bounded(title, body)).await {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!("Classification task for review {} failed: {}", id, e);
                        fallback
                    }
                };
                debug!(
                    "Review {}: {} ({}, {:.2})",
                    id, decision.theme, decision.method, decision.confidence
                );
                (index, decision)
            }
        });

        let mut indexed: Vec<(usize, ThemeDecision)> = stream::iter(jobs)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, decision)| decision).collect()
    }
}

/// Resolves once the shutdown flag is set. A dropped sender never cancels.
async fn cancelled(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_core::Theme;
    use pulse_infer::LabelScorer;
    use pulse_report::{parse_report, EMPTY_REPORT};
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn keyword_pipeline() -> Pipeline {
        let taxonomy = Arc::new(ThemeTaxonomy::builtin());
        let classifier = ThemeClassifier::keyword_only(taxonomy).unwrap();
        Pipeline::new(Arc::new(classifier), 4)
    }

    fn idle_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    fn five_reviews() -> Vec<RawReview> {
        vec![
            RawReview::new("r1", "SIP setup", "portfolio shows wrong investment values", 5, day(1)),
            RawReview::new("r2", "Mutual fund", "trading order execution is slow", 2, day(2)),
            RawReview::new("r3", "UPI failed", "payment stuck, bank not linked", 1, day(3)),
            RawReview::new("r4", "Loan EMI", "interest too high", 3, day(4)),
            RawReview::new("r5", "Support", "customer care never replied", 2, day(5)),
        ]
    }

    #[tokio::test]
    async fn test_end_to_end_report() {
        let pipeline = keyword_pipeline();
        let (_tx, rx) = idle_shutdown();
        let outcome = pipeline.run(five_reviews(), rx).await.unwrap();

        assert_eq!(outcome.reviews.len(), 5);
        assert_eq!(outcome.report.themes[0].name, "Investment Experience");
        assert_eq!(outcome.report.themes.len(), 3);
        assert_eq!(outcome.report.actions.len(), 3);
        assert_eq!(outcome.report.quotes.len(), 3);
        for marker in ["**Top Themes:**", "**Key Quotes:**", "**Action Ideas:**"] {
            assert!(outcome.rendered.contains(marker), "missing {}", marker);
        }

        let parsed = parse_report(&outcome.rendered);
        assert_eq!(parsed.actions[0], "Improve portfolio loading speed and accuracy");
        assert_eq!(outcome.report.period.unwrap().to_string(), "2024-03-01 to 2024-03-05");
    }

    #[tokio::test]
    async fn test_output_in_input_order() {
        let pipeline = keyword_pipeline();
        let (_tx, rx) = idle_shutdown();
        let outcome = pipeline.run(five_reviews(), rx).await.unwrap();

        let ids: Vec<&str> = outcome.reviews.iter().map(|r| r.review.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3", "r4", "r5"]);
        for item in &outcome.reviews {
            assert_eq!(item.classification.review_id, item.review.id);
        }
        let total: usize = outcome.stats.iter().map(|s| s.count).sum();
        assert_eq!(total, 5);
        assert_eq!(outcome.degraded, 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = keyword_pipeline();
        let (_tx, rx) = idle_shutdown();
        let outcome = pipeline.run(Vec::new(), rx).await.unwrap();

        assert!(outcome.reviews.is_empty());
        assert_eq!(outcome.rendered, EMPTY_REPORT);
        assert_eq!(outcome.stats.len(), 5);
        assert!(outcome.stats.iter().all(|s| s.count == 0));
    }

    #[tokio::test]
    async fn test_pii_redacted_before_classification() {
        let pipeline = keyword_pipeline();
        let (_tx, rx) = idle_shutdown();
        let raw = vec![RawReview::new(
            "p1",
            "Refund",
            "mail me at jane@example.com or 9876543210",
            2,
            day(1),
        )];
        let outcome = pipeline.run(raw, rx).await.unwrap();
        let review = &outcome.reviews[0].review;
        assert_eq!(review.normalized_body, "mail me at [EMAIL] or [PHONE]");
        assert!(review.body.contains("jane@example.com"));
        assert!(!outcome.rendered.contains("jane@example.com"));
    }

    #[tokio::test]
    async fn test_undated_reviews_skipped() {
        let pipeline = keyword_pipeline();
        let (_tx, rx) = idle_shutdown();
        let mut undated = RawReview::new("u1", "App", "crash", 1, day(1));
        undated.date = None;
        let raw = vec![undated, RawReview::new("d1", "App", "crash", 1, day(2))];
        let outcome = pipeline.run(raw, rx).await.unwrap();
        assert_eq!(outcome.reviews.len(), 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let pipeline = keyword_pipeline();
        let (tx, rx) = idle_shutdown();
        tx.send(true).unwrap();
        let err = pipeline.run(five_reviews(), rx).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    /// Scorer that blocks long enough for cancellation to land mid-run.
    struct SlowScorer;

    impl LabelScorer for SlowScorer {
        fn score(&self, _text: &str, labels: &[Theme]) -> Result<Vec<f32>> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(vec![1.0 / labels.len() as f32; labels.len()])
        }
        fn is_available(&self) -> bool {
            true
        }
        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_run() {
        let taxonomy = Arc::new(ThemeTaxonomy::builtin());
        let classifier =
            ThemeClassifier::new(taxonomy, Arc::new(SlowScorer), Duration::from_secs(5)).unwrap();
        let pipeline = Pipeline::new(Arc::new(classifier), 1);
        let (tx, rx) = idle_shutdown();

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(true);
        });
        let err = pipeline.run(five_reviews(), rx).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        cancel.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let pipeline = keyword_pipeline();
        let (tx, rx) = idle_shutdown();
        drop(tx);
        let outcome = pipeline.run(five_reviews(), rx).await.unwrap();
        assert_eq!(outcome.reviews.len(), 5);
    }

    /// Scorer that panics on reviews mentioning "boom" and scores the rest.
    struct BoomScorer;

    impl LabelScorer for BoomScorer {
        fn score(&self, text: &str, labels: &[Theme]) -> Result<Vec<f32>> {
            if text.contains("boom") {
                panic!("scorer crashed on {:?}", text);
            }
            let mut scores = vec![0.0; labels.len()];
            scores[0] = 1.0;
            Ok(scores)
        }
        fn is_available(&self) -> bool {
            true
        }
        fn name(&self) -> &'static str {
            "boom"
        }
    }

    fn boom_pipeline() -> Pipeline {
        let taxonomy = Arc::new(ThemeTaxonomy::builtin());
        let classifier =
            ThemeClassifier::new(taxonomy, Arc::new(BoomScorer), Duration::from_secs(5)).unwrap();
        Pipeline::new(Arc::new(classifier), 3)
    }

    #[tokio::test]
    async fn test_panicking_scorer_does_not_sink_batch() {
        let pipeline = boom_pipeline();
        let (_tx, rx) = idle_shutdown();
        let raw = vec![
            RawReview::new("ok1", "SIP", "portfolio fine", 5, day(1)),
            RawReview::new("bad", "UPI boom", "payment went boom", 1, day(2)),
            RawReview::new("ok2", "Loan", "emi fine", 4, day(3)),
        ];
        let outcome = pipeline.run(raw, rx).await.unwrap();

        assert_eq!(outcome.reviews.len(), 3);
        let taxonomy = pipeline.taxonomy();
        for item in &outcome.reviews {
            assert!(taxonomy.contains(&item.classification.theme));
        }
        let bad = &outcome.reviews[1].classification;
        assert_eq!(bad.method, ClassificationMethod::Keyword);
        assert_eq!(bad.theme, "Payment, Banking and Money Flow");
        assert_eq!(outcome.reviews[0].classification.method, ClassificationMethod::Semantic);
        assert_eq!(outcome.degraded, 1);
    }

    #[tokio::test]
    async fn test_blank_review_not_counted_as_degraded() {
        let pipeline = boom_pipeline();
        let (_tx, rx) = idle_shutdown();
        let raw = vec![
            RawReview::new("blank", "   ", "", 3, day(1)),
            RawReview::new("ok", "SIP", "portfolio fine", 5, day(2)),
        ];
        let outcome = pipeline.run(raw, rx).await.unwrap();
        assert_eq!(outcome.reviews[0].classification.method, ClassificationMethod::Default);
        assert_eq!(outcome.degraded, 0);
    }

    #[tokio::test]
    async fn test_degraded_counted_on_timeout() {
        let taxonomy = Arc::new(ThemeTaxonomy::builtin());
        let classifier =
            ThemeClassifier::new(taxonomy, Arc::new(SlowScorer), Duration::from_millis(10))
                .unwrap();
        let pipeline = Pipeline::new(Arc::new(classifier), 5);
        let (_tx, rx) = idle_shutdown();
        let outcome = pipeline.run(five_reviews(), rx).await.unwrap();
        assert_eq!(outcome.degraded, 5);
        assert!(outcome
            .reviews
            .iter()
            .all(|r| r.classification.method != ClassificationMethod::Semantic));
    }
}
