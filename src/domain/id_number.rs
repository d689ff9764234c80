//! Government and financial identifier detection.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches US social security numbers and Luhn-valid card numbers.
#[derive(Debug, Clone, Default)]
pub struct IdNumberMatcher;

impl IdNumberMatcher {
    pub fn new() -> Self {
        Self
    }

    /// SSN structure: area not 000, 666 or 9xx; group not 00; serial not 0000.
    pub fn is_valid_ssn(candidate: &str) -> bool {
        let parts: Vec<&str> = candidate.split('-').collect();
        let [area, group, serial] = parts.as_slice() else {
            return false;
        };
        area.len() == 3
            && group.len() == 2
            && serial.len() == 4
            && *area != "000"
            && *area != "666"
            && !area.starts_with('9')
            && *group != "00"
            && *serial != "0000"
    }

    /// Luhn checksum over the digits of `candidate`.
    pub fn passes_luhn(candidate: &str) -> bool {
        let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
        if !(13..=19).contains(&digits.len()) {
            return false;
        }
        let sum: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &d)| {
                if i % 2 == 1 {
                    let doubled = d * 2;
                    if doubled > 9 {
                        doubled - 9
                    } else {
                        doubled
                    }
                } else {
                    d
                }
            })
            .sum();
        sum % 10 == 0
    }
}

impl PatternMatcher for IdNumberMatcher {
    fn category(&self) -> Category {
        Category::IdNumber
    }

    fn pattern(&self) -> &Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b(?:\d{3}-\d{2}-\d{4}|\d(?:[ -]?\d){12,18})\b")
                .expect("Valid identifier regex")
        });
        &PATTERN
    }

    fn validate(&self, candidate: &str) -> bool {
        Self::is_valid_ssn(candidate) || Self::passes_luhn(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssn() {
        let matcher = IdNumberMatcher::new();
        assert!(matcher.is_match("SSN: 123-45-6789"));
        assert!(!matcher.is_match("000-45-6789"));
        assert!(!matcher.is_match("900-45-6789"));
    }

    #[test]
    fn test_card_numbers() {
        let matcher = IdNumberMatcher::new();
        assert!(matcher.is_match("4111 1111 1111 1111"));
        assert!(!matcher.is_match("4111 1111 1111 1112"));
    }
}
