//! PII detection and redaction using regex patterns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Types of PII that are redacted from review text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiType {
    Email,
    Phone,
    Url,
}

impl PiiType {
    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            PiiType::Email => "EMAIL",
            PiiType::Phone => "PHONE",
            PiiType::Url => "URL",
        }
    }

    /// Literal placeholder substituted for a match, e.g. `[EMAIL]`.
    pub fn placeholder(&self) -> &'static str {
        match self {
            PiiType::Email => "[EMAIL]",
            PiiType::Phone => "[PHONE]",
            PiiType::Url => "[URL]",
        }
    }
}

/// A redacted PII match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiiEntity {
    #[serde(rename = "type")]
    pub pii_type: PiiType,
    pub text: String,
}

/// Result of redacting text.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionResult {
    pub text: String,
    pub entities: Vec<PiiEntity>,
}

// Compiled regex patterns (compiled once, reused).
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{10,}").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap());

/// PII redactor. Patterns are applied in a fixed order, each pass running
/// over the output of the previous one.
pub struct PiiDetector {
    patterns: Vec<(PiiType, &'static Regex)>,
}

impl PiiDetector {
    pub fn new() -> Self {
        Self {
            patterns: vec![
                (PiiType::Email, &*EMAIL_RE),
                (PiiType::Phone, &*PHONE_RE),
                (PiiType::Url, &*URL_RE),
            ],
        }
    }

    /// Replace PII with placeholders and collapse whitespace.
    pub fn redact(&self, text: &str) -> RedactionResult {
        let mut current = text.to_string();
        let mut entities = Vec::new();

        for (pii_type, regex) in &self.patterns {
            let found: Vec<PiiEntity> = regex
                .find_iter(&current)
                .map(|m| PiiEntity {
                    pii_type: *pii_type,
                    text: m.as_str().to_string(),
                })
                .collect();
            if found.is_empty() {
                continue;
            }
            current = regex
                .replace_all(&current, pii_type.placeholder())
                .into_owned();
            entities.extend(found);
        }

        RedactionResult {
            text: collapse_whitespace(&current),
            entities,
        }
    }
}

impl Default for PiiDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

static DETECTOR: Lazy<PiiDetector> = Lazy::new(PiiDetector::new);

/// Redact PII and collapse whitespace. Never fails; empty input yields "".
pub fn normalize(raw: &str) -> String {
    let result = DETECTOR.redact(raw);
    if !result.entities.is_empty() {
        let kinds: Vec<&str> = result.entities.iter().map(|e| e.pii_type.label()).collect();
        debug!("Redacted {} PII entities ({})", kinds.len(), kinds.join(", "));
    }
    result.text
}

/// Like [`normalize`], treating absent input as empty.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_email() {
        let out = normalize("contact me at a@b.com");
        assert!(out.contains("[EMAIL]"));
        assert!(!out.contains("a@b.com"));
        assert_eq!(out, "contact me at [EMAIL]");
    }

    #[test]
    fn test_redact_phone_needs_ten_digits() {
        assert_eq!(normalize("call 9876543210 now"), "call [PHONE] now");
        assert_eq!(normalize("order 123456789 failed"), "order 123456789 failed");
        assert_eq!(normalize("id 123456789012345"), "id [PHONE]");
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            normalize("see https://example.com/path?q=1 for details"),
            "see [URL] for details"
        );
        assert_eq!(normalize("http://x.io"), "[URL]");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(normalize("  too\n\tmany   spaces  "), "too many spaces");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Email a@b.com, call 98765432101, visit https://x.y/z  ok",
            "plain clean text",
            "[EMAIL] [PHONE] [URL]",
            "  1234567890\n\nhttp://a.b/c?d=e  user.name+tag@mail.example.org ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_normalize_opt_absent() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some(" hi ")), "hi");
    }

    #[test]
    fn test_redact_reports_entities_in_order() {
        let detector = PiiDetector::new();
        let entities = detector.redact("mail x@y.com or 1234567890 or https://z.io").entities;
        let types: Vec<PiiType> = entities.iter().map(|e| e.pii_type).collect();
        assert_eq!(types, vec![PiiType::Email, PiiType::Phone, PiiType::Url]);
        assert_eq!(entities[0].text, "x@y.com");
        let labels: Vec<&str> = entities.iter().map(|e| e.pii_type.label()).collect();
        assert_eq!(labels, vec!["EMAIL", "PHONE", "URL"]);
    }
}
