//! Review, classification and report data model.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Date format used for review dates and report periods.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A review as delivered by a review source, before normalization.
///
/// Deserialization is lenient: non-string title/body values are treated as
/// absent, ratings are clamped into 1..=5, and unparseable dates become `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    #[serde(alias = "review_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, alias = "text", deserialize_with = "lenient_text")]
    pub body: Option<String>,
    #[serde(default = "default_rating", deserialize_with = "lenient_rating")]
    pub rating: u8,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

impl RawReview {
    pub fn new(id: &str, title: &str, body: &str, rating: u8, date: NaiveDate) -> Self {
        Self {
            id: id.to_string(),
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            rating: rating.clamp(1, 5),
            date: Some(date),
        }
    }

    /// Whether the review carries any text at all.
    pub fn has_content(&self) -> bool {
        let non_blank = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        non_blank(&self.title) || non_blank(&self.body)
    }
}

fn default_rating() -> u8 {
    3
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_rating<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    let rating = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(match rating {
        Some(r) if r.is_finite() => r.round().clamp(1.0, 5.0) as u8,
        _ => default_rating(),
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        // Accept plain dates and the date prefix of full timestamps.
        serde_json::Value::String(s) => s
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok()),
        _ => None,
    })
}

/// A normalized review. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub title: String,
    pub body: String,
    pub normalized_title: String,
    pub normalized_body: String,
    pub rating: u8,
    pub date: NaiveDate,
}

/// How a classification was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    /// Argmax of the semantic scorer.
    Semantic,
    /// Keyword-overlap fallback with at least one match.
    Keyword,
    /// Nothing matched; assigned the taxonomy's default theme.
    Default,
}

impl std::fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Keyword => write!(f, "keyword"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Theme decision for one review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub review_id: String,
    pub theme: String,
    /// In [0.0, 1.0].
    pub confidence: f64,
    pub rationale: String,
    pub method: ClassificationMethod,
}

/// A review paired with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReview {
    pub review: Review,
    pub classification: Classification,
}

/// Per-theme volume statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeStat {
    pub theme: String,
    pub count: usize,
    /// In [0, 100], rounded to two decimals.
    pub percentage: f64,
}

/// One entry of the report's top-themes section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub name: String,
    pub summary: String,
}

/// A representative quote attributed to a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub theme: String,
    pub text: String,
}

/// Inclusive range of submission dates covered by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Weekly digest produced once per batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseReport {
    pub title: String,
    pub overview: String,
    pub themes: Vec<ThemeSummary>,
    pub quotes: Vec<Quote>,
    pub actions: Vec<String>,
    /// `None` for an empty batch.
    pub period: Option<DateRange>,
    pub total_reviews: usize,
}

impl PulseReport {
    pub fn is_empty(&self) -> bool {
        self.total_reviews == 0
    }
}

/// Flat row of the classified-review table handed to report sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub date: String,
    pub rating: u8,
    pub theme: String,
    pub confidence: f64,
    pub rationale: String,
}

impl From<&ClassifiedReview> for ClassifiedRow {
    fn from(item: &ClassifiedReview) -> Self {
        Self {
            id: item.review.id.clone(),
            title: item.review.normalized_title.clone(),
            body: item.review.normalized_body.clone(),
            date: item.review.date.format(DATE_FORMAT).to_string(),
            rating: item.review.rating,
            theme: item.classification.theme.clone(),
            confidence: item.classification.confidence,
            rationale: item.classification.rationale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_review_lenient_fields() {
        let raw: RawReview = serde_json::from_str(
            r#"{"review_id": 42, "title": null, "text": ["not", "text"], "rating": 9, "date": "2024-03-05T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(raw.id, "42");
        assert_eq!(raw.title, None);
        assert_eq!(raw.body, None);
        assert_eq!(raw.rating, 5);
        assert_eq!(raw.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert!(!raw.has_content());
    }

    #[test]
    fn test_raw_review_bad_date_and_missing_rating() {
        let raw: RawReview =
            serde_json::from_str(r#"{"id": "a", "body": "ok", "date": "yesterday"}"#).unwrap();
        assert_eq!(raw.date, None);
        assert_eq!(raw.rating, 3);
        assert!(raw.has_content());
    }

    #[test]
    fn test_date_range_display() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 10, 5).unwrap(),
        };
        assert_eq!(range.to_string(), "2023-10-01 to 2023-10-05");
    }
}
