//! Email address detection.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `local@domain.tld` addresses, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct EmailMatcher;

impl EmailMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl PatternMatcher for EmailMatcher {
    fn category(&self) -> Category {
        Category::Email
    }

    fn pattern(&self) -> &Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").expect("Valid email regex")
        });
        &PATTERN
    }
}
