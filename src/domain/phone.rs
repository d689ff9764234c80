//! Phone number domain logic.
//!
//! This module encapsulates the rules used to recognise phone numbers in OCR
//! output, where a single number is frequently split across tokens.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Phone number pattern matcher.
///
/// Accepts digit groups separated by single spaces, dots or dashes, with an
/// optional `+CC` prefix and a parenthesised area code:
/// - (555) 234-5678
/// - 555-234-5678
/// - 555.234.5678
/// - +1 555 234 5678
/// - +44 20 7946 0958
#[derive(Debug, Clone)]
pub struct PhoneNumberMatcher;

impl PhoneNumberMatcher {
    /// Creates a new phone number matcher.
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{1,4}\)[-.\s]?)?\d{2,12}(?:[-.\s]\d{2,5}){0,4}\b",
            )
            .expect("Valid phone number regex")
        });
        &PATTERN
    }

    /// Strips everything but digits.
    pub fn digits(text: &str) -> String {
        text.chars().filter(char::is_ascii_digit).collect()
    }

    /// Validates the digit structure of a candidate.
    ///
    /// # Rules
    /// - 10 to 15 digits in total (E.164 upper bound)
    /// - not a run of years such as `2019 2020 2021`
    pub fn validate_digits(candidate: &str) -> bool {
        let count = Self::digits(candidate).len();
        if !(10..=15).contains(&count) {
            return false;
        }

        let groups: Vec<&str> = candidate
            .split(|c: char| !c.is_ascii_digit())
            .filter(|g| !g.is_empty())
            .collect();
        let all_years = groups.len() > 1
            && groups
                .iter()
                .all(|g| g.len() == 4 && (g.starts_with("19") || g.starts_with("20")));
        !all_years
    }

    /// Whether `candidate` contains an ISO date such as `2023-11-04`.
    fn contains_date(candidate: &str) -> bool {
        static DATE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("Valid date regex"));
        DATE.is_match(candidate)
    }

    /// Rejects matches cut out of a longer number: a time (`10:30`), a
    /// thousands-grouped amount (`1,234.56`) or a decimal.
    fn is_standalone(text: &str, range: Range<usize>) -> bool {
        let mut before = text[..range.start].chars().rev();
        match before.next() {
            Some(c) if c.is_ascii_digit() => return false,
            Some(',' | '.') if before.next().is_some_and(|c| c.is_ascii_digit()) => return false,
            _ => {}
        }

        let mut after = text[range.end..].chars();
        !matches!(
            (after.next(), after.next()),
            (Some(':' | ',' | '.'), Some(c)) if c.is_ascii_digit()
        )
    }
}

impl Default for PhoneNumberMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher for PhoneNumberMatcher {
    fn category(&self) -> Category {
        Category::Phone
    }

    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn validate(&self, candidate: &str) -> bool {
        Self::validate_digits(candidate) && !Self::contains_date(candidate)
    }

    fn validate_in(&self, text: &str, range: Range<usize>) -> bool {
        self.validate(&text[range.clone()]) && Self::is_standalone(text, range)
    }

    fn spans_tokens(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_extraction() {
        let matcher = PhoneNumberMatcher::new();
        let text = "Call us at (555) 123-4567 or 555-987-6543";
        let numbers = matcher.extract_all(text);
        assert_eq!(numbers.len(), 2);
    }

    #[test]
    fn test_international_formats() {
        let matcher = PhoneNumberMatcher::new();
        assert!(matcher.is_match("+44 20 7946 0958"));
        assert!(matcher.is_match("+1 555 234 5678"));
        assert!(matcher.is_match("98765 43210"));
        assert!(matcher.is_match("5552345678"));
    }

    #[test]
    fn test_short_numbers_rejected() {
        let matcher = PhoneNumberMatcher::new();
        assert!(!matcher.is_match("911"));
        assert!(!matcher.is_match("12345"));
        assert!(!matcher.is_match("123-45-6789"));
    }

    #[test]
    fn test_year_runs_rejected() {
        assert!(!PhoneNumberMatcher::validate_digits("2019 2020 2021"));
        assert!(PhoneNumberMatcher::validate_digits("2019 202 1234"));
    }

    #[test]
    fn test_timestamps_rejected() {
        let matcher = PhoneNumberMatcher::new();
        assert!(!matcher.is_match("2023-11-04 10:30"));
        assert!(matcher.extract_all("Issued 2023-11-04 10:30:15 UTC").is_empty());
    }

    #[test]
    fn test_amounts_rejected() {
        let matcher = PhoneNumberMatcher::new();
        assert!(!matcher.is_match("Total 1,234.56 2023-11-04"));
        assert!(!matcher.is_match("Balance 12,345,678.90 due"));
    }

    #[test]
    fn test_trailing_punctuation_kept() {
        let matcher = PhoneNumberMatcher::new();
        assert_eq!(
            matcher.extract_all("Call 555-234-5678, thanks."),
            vec!["555-234-5678"]
        );
        assert!(matcher.is_match("Reach me at 555.234.5678."));
    }
}
