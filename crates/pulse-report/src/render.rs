//! Markdown rendering of a pulse report, and the matching re-parser.
//!
//! Downstream consumers locate sections by the literal markers below and
//! list items by a leading `"- "`. Both must stay byte-stable.

use pulse_core::PulseReport;
use serde::Serialize;

use crate::synthesize::{EMPTY_OVERVIEW, EMPTY_TITLE};

pub const OVERVIEW_MARKER: &str = "**Overview:**";
pub const THEMES_MARKER: &str = "**Top Themes:**";
pub const QUOTES_MARKER: &str = "**Key Quotes:**";
pub const ACTIONS_MARKER: &str = "**Action Ideas:**";
const ITEM_PREFIX: &str = "- ";

/// Rendered text of a report over an empty batch.
pub const EMPTY_REPORT: &str = "# Weekly Product Pulse Report\n\nNo reviews found for this period.";

/// Render a report to the fixed text layout.
pub fn render(report: &PulseReport) -> String {
    let period = match &report.period {
        Some(period) if !report.is_empty() => period.to_string(),
        _ => return format!("# {}\n\n{}", EMPTY_TITLE, EMPTY_OVERVIEW),
    };

    let mut lines = vec![
        format!("# {}", report.title),
        String::new(),
        format!("{} {}", OVERVIEW_MARKER, report.overview),
        String::new(),
        THEMES_MARKER.to_string(),
    ];
    lines.extend(
        report
            .themes
            .iter()
            .map(|t| format!("{}{}: {}", ITEM_PREFIX, t.name, t.summary)),
    );

    lines.push(String::new());
    lines.push(QUOTES_MARKER.to_string());
    lines.extend(
        report
            .quotes
            .iter()
            .map(|q| format!("{}[{}] {}", ITEM_PREFIX, q.theme, q.text)),
    );

    lines.push(String::new());
    lines.push(ACTIONS_MARKER.to_string());
    lines.extend(report.actions.iter().map(|a| format!("{}{}", ITEM_PREFIX, a)));

    lines.extend([
        String::new(),
        "---".to_string(),
        "*Report generated automatically from customer reviews*".to_string(),
        format!("*Period: {}*", period),
    ]);

    lines.join("\n")
}

/// Structured view of a rendered report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedReport {
    pub title: String,
    pub overview: String,
    /// (theme name, summary)
    pub themes: Vec<(String, String)>,
    pub quotes: Vec<String>,
    pub actions: Vec<String>,
}

#[derive(Clone, Copy)]
enum Section {
    Themes,
    Quotes,
    Actions,
}

/// Parse rendered report text back into its sections.
///
/// Unknown lines are ignored; a missing section yields an empty list.
pub fn parse_report(text: &str) -> ParsedReport {
    let mut parsed = ParsedReport::default();
    let mut section: Option<Section> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(title) = line.strip_prefix("# ") {
            parsed.title = title.to_string();
        } else if let Some(overview) = line.strip_prefix(OVERVIEW_MARKER) {
            parsed.overview = overview.trim().to_string();
        } else if line.starts_with(THEMES_MARKER) {
            section = Some(Section::Themes);
        } else if line.starts_with(QUOTES_MARKER) {
            section = Some(Section::Quotes);
        } else if line.starts_with(ACTIONS_MARKER) {
            section = Some(Section::Actions);
        } else if line == "---" {
            section = None;
        } else if let Some(item) = line.strip_prefix(ITEM_PREFIX) {
            match section {
                Some(Section::Themes) => {
                    if let Some((name, summary)) = item.split_once(':') {
                        parsed
                            .themes
                            .push((name.trim().to_string(), summary.trim().to_string()));
                    }
                }
                Some(Section::Quotes) => parsed.quotes.push(item.to_string()),
                Some(Section::Actions) => parsed.actions.push(item.to_string()),
                None => {}
            }
        }
    }

    parsed
}
