//! Review sources — where raw reviews come from.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use pulse_core::{Error, RawReview, Result};
use tracing::{debug, info, warn};

/// Trailing time window and count limit for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewQuery {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub max_reviews: usize,
}

impl ReviewQuery {
    /// The `weeks` weeks up to and including `until`.
    ///
    /// Fails if the window reaches past the earliest representable date.
    pub fn trailing_weeks(until: NaiveDate, weeks: u32, max_reviews: usize) -> Result<Self> {
        let since = until
            .checked_sub_signed(Duration::weeks(i64::from(weeks)))
            .ok_or_else(|| {
                Error::Config(format!("review window of {} weeks is out of range", weeks))
            })?;
        Ok(Self {
            since,
            until,
            max_reviews,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since <= date && date <= self.until
    }

    /// Keep reviews with content inside the window, newest first, capped.
    pub fn select(&self, reviews: Vec<RawReview>) -> Vec<RawReview> {
        let mut selected: Vec<RawReview> = reviews
            .into_iter()
            .filter(|r| r.has_content())
            .filter(|r| r.date.is_some_and(|d| self.contains(d)))
            .collect();
        selected.sort_by(|a, b| b.date.cmp(&a.date));
        selected.truncate(self.max_reviews);
        selected
    }
}

/// A finite supplier of raw reviews.
pub trait ReviewSource: Send + Sync {
    fn fetch(&self, query: &ReviewQuery) -> Result<Vec<RawReview>>;

    fn name(&self) -> &str;
}

/// Reads a JSON array of reviews from disk.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReviewSource for JsonFileSource {
    fn fetch(&self, query: &ReviewQuery) -> Result<Vec<RawReview>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Source(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let all: Vec<RawReview> = serde_json::from_str(&content).map_err(|e| {
            Error::Source(format!("invalid review file {}: {}", self.path.display(), e))
        })?;

        let total = all.len();
        let undated = all.iter().filter(|r| r.date.is_none()).count();
        if undated > 0 {
            warn!("{} reviews in {} have no usable date", undated, self.path.display());
        }

        let selected = query.select(all);
        info!(
            "Loaded {} of {} reviews from {} ({} to {})",
            selected.len(),
            total,
            self.path.display(),
            query.since,
            query.until
        );
        Ok(selected)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

/// Built-in sample reviews, dated relative to the query's end date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleSource;

/// (id, title, body, rating, days before `until`)
const SAMPLES: &[(&str, &str, &str, u8, i64)] = &[
    ("gp_001", "Excellent investment platform", "The mutual fund investment process is smooth and the portfolio tracking is very accurate. Love the SIP feature!", 5, 0),
    ("gp_002", "UPI payment issues", "Facing issues with UPI payments. Transaction fails after entering UPI pin. Please fix this urgently.", 2, 1),
    ("gp_003", "App crashes frequently", "The app keeps crashing especially when viewing the portfolio section. Need urgent fix. Otherwise great app.", 3, 2),
    ("gp_004", "Slow customer support", "Reached out to customer support for an issue with my SIP. Response took more than 48 hours. Could be faster.", 3, 3),
    ("gp_005", "Loan process improvement needed", "The loan approval process takes too long. Had to submit documents multiple times. Documentation could be better.", 2, 4),
    ("gp_006", "Great for beginners", "As a new investor, this app has been very helpful. The educational content is excellent and easy to understand.", 5, 5),
    ("gp_007", "Withdrawal delays", "Had to wait more than a week for my withdrawal to be processed. This needs immediate attention.", 2, 6),
    ("gp_008", "User-friendly interface", "The app is very intuitive and easy to navigate. Finding investments and tracking them is a breeze.", 4, 9),
    ("gp_009", "Security concerns", "Not comfortable with the new permission requirements. Hope the team takes user privacy seriously.", 3, 12),
    ("gp_010", "Best investment app", "Hands down the best investment app in India. The research tools and market insights are top notch.", 5, 16),
    ("gp_011", "KYC process too lengthy", "The KYC verification took more than a week. The document upload process kept failing multiple times.", 2, 20),
    ("gp_012", "SIP investment feature", "Setting up SIP investments is so easy. The reminders and notifications are very helpful.", 5, 27),
];

impl ReviewSource for SampleSource {
    fn fetch(&self, query: &ReviewQuery) -> Result<Vec<RawReview>> {
        let reviews: Vec<RawReview> = SAMPLES
            .iter()
            .filter_map(|(id, title, body, rating, days_ago)| {
                let date = query.until.checked_sub_signed(Duration::days(*days_ago))?;
                Some(RawReview::new(id, title, body, *rating, date))
            })
            .collect();
        let selected = query.select(reviews);
        debug!("Sample source yielded {} reviews", selected.len());
        Ok(selected)
    }

    fn name(&self) -> &str {
        "sample"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_trailing_window() {
        let q = ReviewQuery::trailing_weeks(day(15), 1, 10).unwrap();
        assert_eq!(q.since, day(8));
        assert!(q.contains(day(8)));
        assert!(q.contains(day(15)));
        assert!(!q.contains(day(7)));
        assert!(!q.contains(day(16)));
    }

    #[test]
    fn test_trailing_window_overflow_is_config_error() {
        let err = ReviewQuery::trailing_weeks(day(15), 20_000_000, 10).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let widest = ReviewQuery::trailing_weeks(day(15), 52 * 100, 10).unwrap();
        assert!(widest.since < day(1));
    }

    #[test]
    fn test_json_file_source_filters_and_orders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"review_id": "a", "title": "Old", "text": "too old", "rating": 4, "date": "2024-02-01"}},
                {{"review_id": "b", "title": "Mid", "text": "in window", "rating": 2, "date": "2024-03-10"}},
                {{"review_id": "c", "title": "New", "text": "in window", "rating": "5", "date": "2024-03-14T08:00:00"}},
                {{"review_id": "d", "title": null, "text": "   ", "rating": 1, "date": "2024-03-12"}},
                {{"review_id": 7, "title": "Numeric id", "text": "ok", "rating": 9, "date": "2024-03-11"}},
                {{"review_id": "e", "title": "No date", "text": "dropped"}}
            ]"#
        )
        .unwrap();

        let source = JsonFileSource::new(file.path());
        let q = ReviewQuery::trailing_weeks(day(15), 1, 10).unwrap();
        let reviews = source.fetch(&q).unwrap();

        let ids: Vec<&str> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "7", "b"]);
        assert_eq!(reviews[0].rating, 5);
        assert_eq!(reviews[1].rating, 5);
    }

    #[test]
    fn test_json_file_source_truncates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "a", "title": "A", "body": "x", "rating": 3, "date": "2024-03-09"}},
                {{"id": "b", "title": "B", "body": "x", "rating": 3, "date": "2024-03-13"}},
                {{"id": "c", "title": "C", "body": "x", "rating": 3, "date": "2024-03-11"}}
            ]"#
        )
        .unwrap();

        let q = ReviewQuery::trailing_weeks(day(15), 1, 2).unwrap();
        let reviews = JsonFileSource::new(file.path()).fetch(&q).unwrap();
        let ids: Vec<&str> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_json_file_source_errors() {
        let q = ReviewQuery::trailing_weeks(day(15), 1, 10).unwrap();
        let missing = JsonFileSource::new("/nonexistent/reviews.json").fetch(&q);
        assert!(matches!(missing, Err(Error::Source(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let bad = JsonFileSource::new(file.path()).fetch(&q);
        assert!(matches!(bad, Err(Error::Source(_))));
    }

    #[test]
    fn test_sample_source_window() {
        let week = ReviewQuery::trailing_weeks(day(28), 1, 100).unwrap();
        let reviews = SampleSource.fetch(&week).unwrap();
        assert_eq!(reviews.len(), 7);
        assert_eq!(reviews[0].id, "gp_001");

        let month = ReviewQuery::trailing_weeks(day(28), 4, 100).unwrap();
        assert_eq!(SampleSource.fetch(&month).unwrap().len(), 12);

        let capped = ReviewQuery::trailing_weeks(day(28), 4, 3).unwrap();
        assert_eq!(SampleSource.fetch(&capped).unwrap().len(), 3);
    }
}
