//! Credential and secret-looking token detection.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Well-known secret formats, accepted without further checks.
static KNOWN_FORMATS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"AKIA[0-9A-Z]{16}",
        r"|gh[pousr]_[A-Za-z0-9]{36,}",
        r"|xox[abprs]-[A-Za-z0-9-]{10,}",
        r"|AIza[0-9A-Za-z_-]{35}",
        r"|(?:sk|pk|rk)[-_][A-Za-z0-9_-]{16,}",
        r"|eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
        r"|(?i:password|passwd|pwd|secret|token|api_?key)[:=]\S+",
        r")$",
    ))
    .expect("Valid credential format regex")
});

/// Matches API keys, tokens and inline `password=...` assignments.
///
/// Besides the known vendor formats, any run of 24+ token characters that
/// mixes at least three of upper case, lower case, digits and symbols is
/// treated as secret-looking.
#[derive(Debug, Clone, Default)]
pub struct CredentialMatcher;

impl CredentialMatcher {
    pub fn new() -> Self {
        Self
    }

    fn character_classes(candidate: &str) -> usize {
        let upper = candidate.chars().any(|c| c.is_ascii_uppercase());
        let lower = candidate.chars().any(|c| c.is_ascii_lowercase());
        let digit = candidate.chars().any(|c| c.is_ascii_digit());
        let symbol = candidate.chars().any(|c| "_-+/=".contains(c));
        [upper, lower, digit, symbol].iter().filter(|&&b| b).count()
    }
}

impl PatternMatcher for CredentialMatcher {
    fn category(&self) -> Category {
        Category::Credential
    }

    fn pattern(&self) -> &Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"(?i:password|passwd|pwd|secret|token|api_?key)[:=]\S+|eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+|[A-Za-z0-9_\-+/=]{20,}",
            )
            .expect("Valid credential regex")
        });
        &PATTERN
    }

    fn validate(&self, candidate: &str) -> bool {
        KNOWN_FORMATS.is_match(candidate)
            || (candidate.len() >= 24 && Self::character_classes(candidate) >= 3)
    }
}
