//! Pulse report synthesis.
//!
//! Deterministic given its input: no clock reads, no randomness. Ordering
//! ties fall back to input order.

use pulse_core::{
    Classification, ClassifiedReview, DateRange, PulseReport, Quote, ThemeSummary, ThemeTaxonomy,
};
use tracing::debug;

use crate::aggregate::top_n;

/// Upper bound on themes, quotes and actions in a report.
pub const MAX_ENTRIES: usize = 3;

/// Quotes longer than this many characters are truncated.
const MAX_QUOTE_CHARS: usize = 150;
const ELLIPSIS: &str = "...";

pub(crate) const EMPTY_TITLE: &str = "Weekly Product Pulse Report";
pub(crate) const EMPTY_OVERVIEW: &str = "No reviews found for this period.";

/// Sentiment bucket for a theme's average rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Mixed,
    Negative,
}

impl Sentiment {
    /// `>= 4` positive, `>= 3` mixed, otherwise negative.
    pub fn from_average(avg: f64) -> Self {
        if avg >= 4.0 {
            Self::Positive
        } else if avg >= 3.0 {
            Self::Mixed
        } else {
            Self::Negative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Mixed => "mixed",
            Self::Negative => "negative",
        }
    }
}

/// Canned actions for known themes.
fn canned_actions(theme: &str) -> Option<[&'static str; 3]> {
    let actions = match theme {
        "Investment Experience" => [
            "Improve portfolio loading speed and accuracy",
            "Enhance SIP setup flow with clearer guidance",
            "Add more educational content for new investors",
        ],
        "Payment, Banking and Money Flow" => [
            "Optimize UPI payment flow to reduce failures",
            "Streamline KYC process with better error handling",
            "Improve bank linking success rate",
        ],
        "Loans and Insurance Experience" => [
            "Reduce loan approval turnaround time",
            "Simplify insurance claim process with status tracking",
            "Improve document verification experience",
        ],
        "Customer Support, Service and Trust" => [
            "Reduce first response time for support tickets",
            "Implement proactive communication during outages",
            "Add self-service options for common issues",
        ],
        "App performance, Usability & Reliability" => [
            "Fix critical app crashes reported in reviews",
            "Optimize app performance on low-end devices",
            "Improve navigation flow based on user feedback",
        ],
        _ => return None,
    };
    Some(actions)
}

/// Three action ideas for a theme: canned when known, generic otherwise.
pub fn action_ideas(theme: &str, review_count: usize) -> Vec<String> {
    match canned_actions(theme) {
        Some(actions) => actions.iter().map(|a| a.to_string()).collect(),
        None => {
            let lower = theme.to_lowercase();
            vec![
                format!("Conduct detailed analysis of {} {} issues", review_count, lower),
                format!("Prioritize {} improvements in next sprint", lower),
                format!("Gather more user feedback on {} pain points", lower),
            ]
        }
    }
}

/// `"{title}. {body}"`, cut to 147 characters plus an ellipsis when longer
/// than 150 characters.
pub fn build_quote(title: &str, body: &str) -> String {
    let quote = format!("{}. {}", title, body);
    if quote.chars().count() <= MAX_QUOTE_CHARS {
        return quote;
    }
    let keep = MAX_QUOTE_CHARS - ELLIPSIS.len();
    let mut truncated: String = quote.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Highest-ranked review of a theme: confidence descending, then newest.
fn representative<'a>(items: &[&'a ClassifiedReview]) -> Option<&'a ClassifiedReview> {
    let mut ranked = items.to_vec();
    ranked.sort_by(|a, b| {
        b.classification
            .confidence
            .total_cmp(&a.classification.confidence)
            .then_with(|| b.review.date.cmp(&a.review.date))
    });
    ranked.first().copied()
}

fn empty_report() -> PulseReport {
    PulseReport {
        title: EMPTY_TITLE.to_string(),
        overview: EMPTY_OVERVIEW.to_string(),
        themes: Vec::new(),
        quotes: Vec::new(),
        actions: Vec::new(),
        period: None,
        total_reviews: 0,
    }
}

/// Build the weekly pulse report from classified reviews.
pub fn synthesize(items: &[ClassifiedReview], taxonomy: &ThemeTaxonomy) -> PulseReport {
    if items.is_empty() {
        return empty_report();
    }

    let period = date_range(items);
    let classifications: Vec<Classification> =
        items.iter().map(|i| i.classification.clone()).collect();
    let top_themes = top_n(&classifications, taxonomy, MAX_ENTRIES);

    let mut themes = Vec::with_capacity(top_themes.len());
    let mut quotes = Vec::new();
    let mut actions = Vec::new();

    for theme in &top_themes {
        let members: Vec<&ClassifiedReview> = items
            .iter()
            .filter(|i| &i.classification.theme == theme)
            .collect();

        let avg_rating = members.iter().map(|i| f64::from(i.review.rating)).sum::<f64>()
            / members.len() as f64;
        let sentiment = Sentiment::from_average(avg_rating);
        debug!("Theme '{}': {} reviews, avg rating {:.2}", theme, members.len(), avg_rating);

        themes.push(ThemeSummary {
            name: theme.clone(),
            summary: format!(
                "{} feedback on {}. Key issues identified.",
                capitalize(sentiment.label()),
                theme.to_lowercase()
            ),
        });

        if let Some(best) = representative(&members) {
            quotes.push(Quote {
                theme: theme.clone(),
                text: build_quote(&best.review.normalized_title, &best.review.normalized_body),
            });
        }

        actions.extend(action_ideas(theme, members.len()));
    }

    quotes.truncate(MAX_ENTRIES);
    actions.truncate(MAX_ENTRIES);

    PulseReport {
        title: format!("Weekly Product Pulse: {}", period),
        overview: format!(
            "This week, we analyzed {} customer reviews and the top themes highlight key areas for improvement and celebration.",
            items.len()
        ),
        themes,
        quotes,
        actions,
        period: Some(period),
        total_reviews: items.len(),
    }
}

/// Earliest and latest submission date; callers guarantee `items` is non-empty.
fn date_range(items: &[ClassifiedReview]) -> DateRange {
    let first = items[0].review.date;
    let (start, end) = items.iter().fold((first, first), |(lo, hi), i| {
        (lo.min(i.review.date), hi.max(i.review.date))
    });
    DateRange { start, end }
}
