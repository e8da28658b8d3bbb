//! Theme taxonomy — the fixed, ordered set of themes a review can be assigned to.
//!
//! A taxonomy is validated once at load time and then shared read-only
//! (`Arc<ThemeTaxonomy>`) by the classifier, aggregator and synthesizer.
//! Declaration order is significant: it is the tie-break order for both
//! keyword scoring and theme ranking.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// A single named theme with its description and keyword list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Lowercased, whole-word keywords. Multi-word keywords are allowed.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Theme {
    pub fn new(name: &str, description: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// On-disk shape of a taxonomy file, prior to validation.
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    themes: Vec<Theme>,
    default_theme: String,
}

/// Validated, ordered theme taxonomy.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeTaxonomy {
    themes: Vec<Theme>,
    default_theme: String,
}

impl ThemeTaxonomy {
    /// Build a taxonomy, rejecting inconsistent definitions.
    ///
    /// Keywords are trimmed and lowercased so matching is case-insensitive.
    pub fn new(themes: Vec<Theme>, default_theme: impl Into<String>) -> Result<Self> {
        let default_theme = default_theme.into();

        if themes.is_empty() {
            return Err(Error::Taxonomy("taxonomy has no themes".into()));
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(themes.len());
        for mut theme in themes {
            if theme.name.trim().is_empty() {
                return Err(Error::Taxonomy("theme name must not be empty".into()));
            }
            if !seen.insert(theme.name.clone()) {
                return Err(Error::Taxonomy(format!(
                    "duplicate theme name: {}",
                    theme.name
                )));
            }
            let mut keywords = Vec::with_capacity(theme.keywords.len());
            for keyword in &theme.keywords {
                let keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(Error::Taxonomy(format!(
                        "theme '{}' has an empty keyword",
                        theme.name
                    )));
                }
                keywords.push(keyword);
            }
            theme.keywords = keywords;
            normalized.push(theme);
        }

        if !seen.contains(&default_theme) {
            return Err(Error::Taxonomy(format!(
                "default theme '{}' is not a member of the taxonomy",
                default_theme
            )));
        }

        Ok(Self {
            themes: normalized,
            default_theme,
        })
    }

    /// Parse and validate a taxonomy from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TaxonomyFile = serde_json::from_str(json)?;
        Self::new(file.themes, file.default_theme)
    }

    /// Load and validate a taxonomy file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let taxonomy = Self::from_json(&json)?;
        info!(
            "Loaded taxonomy from {} ({} themes)",
            path.display(),
            taxonomy.len()
        );
        Ok(taxonomy)
    }

    /// Built-in taxonomy for a retail investing app.
    pub fn builtin() -> Self {
        let themes = vec![
            Theme::new(
                "Investment Experience",
                "Mutual fund investment process, stock trading experience, order execution speed, portfolio display and accuracy, SIP experience",
                &[
                    "mutual fund", "investment", "portfolio", "sip", "trading",
                    "order execution", "fund performance", "investing", "mf",
                    "buy fund", "sell fund", "fund purchase",
                ],
            ),
            Theme::new(
                "Payment, Banking and Money Flow",
                "UPI deposits, withdrawals to bank account, settlement time, KYC and onboarding, bank linking, payment failures, auto-pay",
                &[
                    "upi", "payment", "bank", "withdrawal", "deposit", "kyc",
                    "onboarding", "settlement", "autopay", "transaction",
                    "bank account", "banking", "money transfer",
                ],
            ),
            Theme::new(
                "Loans and Insurance Experience",
                "Loan approval process, credit limit accuracy, interest charges, repayment handling, insurance buying, claims support, document verification",
                &[
                    "loan", "credit", "interest", "repayment", "insurance",
                    "claim", "emi", "borrow", "lending", "credit limit",
                    "loan approval", "insurance policy",
                ],
            ),
            Theme::new(
                "Customer Support, Service and Trust",
                "Help center, chatbot and agent responsiveness, issue resolution speed, transparency of charges, trust and security, communication during outages",
                &[
                    "support", "help center", "chatbot", "agent", "resolution",
                    "trust", "security", "communication", "service",
                    "customer care", "helpdesk", "assistance", "problem solved",
                ],
            ),
            Theme::new(
                "App performance, Usability & Reliability",
                "App speed, login issues, bugs and crashes, UI clarity, dark mode, charts and navigation, overall experience of using the app",
                &[
                    "app", "crash", "bug", "speed", "ui", "navigation",
                    "dark mode", "interface", "performance", "usability",
                    "slow", "lag", "freeze", "user experience",
                ],
            ),
        ];

        // The built-in definitions are statically valid.
        match Self::new(themes, "App performance, Usability & Reliability") {
            Ok(taxonomy) => taxonomy,
            Err(e) => unreachable!("built-in taxonomy is invalid: {}", e),
        }
    }

    /// Themes in declaration order.
    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// Theme names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.name.as_str()).collect()
    }

    /// The catch-all theme assigned when nothing matches.
    pub fn default_theme(&self) -> &str {
        &self.default_theme
    }

    /// Declaration index of a theme, if it is a member.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.themes.iter().position(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    /// Always false for a validated taxonomy.
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}
