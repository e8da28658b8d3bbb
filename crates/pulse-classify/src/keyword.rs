//! Keyword-overlap theme scoring — the always-available classification path.
//!
//! Each theme's score is the total number of whole-word keyword occurrences
//! in the lowercased `title + " " + body`. The highest score wins; ties go
//! to the theme declared first in the taxonomy.

use pulse_core::{Classification, ClassificationMethod, Error, Result, ThemeTaxonomy};
use regex::Regex;
use serde::Serialize;

/// Rationale attached to reviews no theme matched.
pub const DEFAULT_RATIONALE: &str = "default classification for unmatched review";

/// Keyword score at which confidence saturates at 1.0.
const SATURATION_SCORE: f64 = 5.0;

/// Rationale lists at most this many matched keywords.
const RATIONALE_KEYWORDS: usize = 3;

/// A theme decision before it is tied to a review identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeDecision {
    pub theme: String,
    pub confidence: f64,
    pub rationale: String,
    pub method: ClassificationMethod,
    /// Set when a loaded semantic scorer was tried and did not answer.
    #[serde(skip)]
    pub degraded: bool,
}

impl ThemeDecision {
    /// Default-theme decision with zero confidence.
    pub fn default_for(taxonomy: &ThemeTaxonomy) -> Self {
        Self {
            theme: taxonomy.default_theme().to_string(),
            confidence: 0.0,
            rationale: DEFAULT_RATIONALE.to_string(),
            method: ClassificationMethod::Default,
            degraded: false,
        }
    }

    /// Mark this decision as a fallback for a failed semantic attempt.
    pub fn into_degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn into_classification(self, review_id: &str) -> Classification {
        Classification {
            review_id: review_id.to_string(),
            theme: self.theme,
            confidence: self.confidence,
            rationale: self.rationale,
            method: self.method,
        }
    }
}

/// Keyword hits for one theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordScore {
    pub theme: String,
    pub score: usize,
    /// Matched keywords, in keyword-list order.
    pub matched: Vec<String>,
}

struct ThemePatterns {
    theme: String,
    keywords: Vec<(String, Regex)>,
}

/// Precompiled whole-word keyword patterns for a taxonomy.
pub struct KeywordMatcher {
    themes: Vec<ThemePatterns>,
}

impl KeywordMatcher {
    /// Compile `\b<keyword>\b` patterns for every theme, in declaration order.
    pub fn new(taxonomy: &ThemeTaxonomy) -> Result<Self> {
        let mut themes = Vec::with_capacity(taxonomy.len());
        for theme in taxonomy.themes() {
            let mut keywords = Vec::with_capacity(theme.keywords.len());
            for keyword in &theme.keywords {
                let pattern = format!(r"\b{}\b", regex::escape(keyword));
                let re = Regex::new(&pattern).map_err(|e| {
                    Error::Taxonomy(format!("bad keyword '{}' in '{}': {}", keyword, theme.name, e))
                })?;
                keywords.push((keyword.clone(), re));
            }
            themes.push(ThemePatterns {
                theme: theme.name.clone(),
                keywords,
            });
        }
        Ok(Self { themes })
    }

    /// Per-theme scores for already-lowercased text, in taxonomy order.
    pub fn scores(&self, text_lower: &str) -> Vec<KeywordScore> {
        self.themes
            .iter()
            .map(|patterns| {
                let mut score = 0;
                let mut matched = Vec::new();
                for (keyword, re) in &patterns.keywords {
                    let hits = re.find_iter(text_lower).count();
                    if hits > 0 {
                        score += hits;
                        matched.push(keyword.clone());
                    }
                }
                KeywordScore {
                    theme: patterns.theme.clone(),
                    score,
                    matched,
                }
            })
            .collect()
    }

    /// Classify by keyword overlap, falling back to the default theme.
    pub fn classify(&self, title: &str, body: &str, taxonomy: &ThemeTaxonomy) -> ThemeDecision {
        let text = format!("{} {}", title, body).to_lowercase();
        let scores = self.scores(&text);

        // Stable argmax: only a strictly higher score replaces the leader.
        let mut best: Option<&KeywordScore> = None;
        for candidate in &scores {
            if best.map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }

        match best {
            Some(best) if best.score > 0 => ThemeDecision {
                theme: best.theme.clone(),
                confidence: (best.score as f64 / SATURATION_SCORE).min(1.0),
                rationale: format!(
                    "Matched keywords: {}",
                    best.matched
                        .iter()
                        .take(RATIONALE_KEYWORDS)
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                method: ClassificationMethod::Keyword,
                degraded: false,
            },
            _ => ThemeDecision::default_for(taxonomy),
        }
    }
}
