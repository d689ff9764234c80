//! Deterministic rule pass.

use crate::domain::{
    Category, CredentialMatcher, EmailMatcher, IdNumberMatcher, IpAddressMatcher, PatternMatcher,
    PhoneNumberMatcher, Word,
};
use std::ops::Range;

/// Number of adjacent tokens joined when a matcher spans tokens.
pub const TOKEN_SPAN: usize = 3;

/// Ordered set of pattern matchers; the first matcher that fires on a word
/// decides its category.
pub struct RuleEngine {
    matchers: Vec<Box<dyn PatternMatcher>>,
}

impl RuleEngine {
    /// Default rule order: email, IP, credential, id number, phone.
    ///
    /// IP and id numbers precede phones because their digit runs would
    /// otherwise be claimed by the looser phone pattern.
    pub fn new() -> Self {
        Self::with_matchers(vec![
            Box::new(EmailMatcher::new()),
            Box::new(IpAddressMatcher::new()),
            Box::new(CredentialMatcher::new()),
            Box::new(IdNumberMatcher::new()),
            Box::new(PhoneNumberMatcher::new()),
        ])
    }

    pub fn with_matchers(matchers: Vec<Box<dyn PatternMatcher>>) -> Self {
        Self { matchers }
    }

    /// Category of a single token, if any rule matches it.
    pub fn classify_word(&self, text: &str) -> Option<Category> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.matchers
            .iter()
            .find(|m| m.is_match(text))
            .map(|m| m.category())
    }

    /// Categories for every word of a page, in order.
    ///
    /// Matchers that span tokens are also run over each window of up to
    /// [`TOKEN_SPAN`] adjacent words joined by single spaces; every word the
    /// match overlaps receives the category unless an earlier pass already
    /// claimed it.
    pub fn classify_page(&self, words: &[Word]) -> Vec<Option<Category>> {
        let mut categories: Vec<Option<Category>> =
            words.iter().map(|w| self.classify_word(&w.text)).collect();

        for matcher in self.matchers.iter().filter(|m| m.spans_tokens()) {
            for start in 0..words.len() {
                let end = (start + TOKEN_SPAN).min(words.len());
                if end - start < 2 {
                    continue;
                }
                let (joined, ranges) = join_tokens(&words[start..end]);
                for span in matcher.find_spans(&joined) {
                    for (offset, range) in ranges.iter().enumerate() {
                        let overlaps = range.start < span.end && span.start < range.end;
                        let slot = &mut categories[start + offset];
                        if overlaps && slot.is_none() {
                            *slot = Some(matcher.category());
                        }
                    }
                }
            }
        }

        categories
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins trimmed token texts with single spaces and records where each token
/// landed in the joined string.
fn join_tokens(words: &[Word]) -> (String, Vec<Range<usize>>) {
    let mut joined = String::new();
    let mut ranges = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            joined.push(' ');
        }
        let start = joined.len();
        joined.push_str(word.text.trim());
        ranges.push(start..joined.len());
    }
    (joined, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixelBox;

    fn words(texts: &[&str]) -> Vec<Word> {
        texts
            .iter()
            .map(|t| Word::new(*t, PixelBox::new(0, 0, 10, 10), 90.0))
            .collect()
    }

    #[test]
    fn test_single_token_rules() {
        let rules = RuleEngine::new();
        assert_eq!(rules.classify_word("jane@example.com"), Some(Category::Email));
        assert_eq!(rules.classify_word("10.0.0.1"), Some(Category::Ip));
        assert_eq!(rules.classify_word("123-45-6789"), Some(Category::IdNumber));
        assert_eq!(rules.classify_word("555-234-5678"), Some(Category::Phone));
        assert_eq!(rules.classify_word("Invoice"), None);
    }

    #[test]
    fn test_phone_split_across_tokens() {
        let rules = RuleEngine::new();
        let page = words(&["Call", "(555)", "234-5678", "today"]);
        let result = rules.classify_page(&page);
        assert_eq!(
            result,
            vec![None, Some(Category::Phone), Some(Category::Phone), None]
        );
    }

    #[test]
    fn test_email_split_is_not_repaired() {
        let rules = RuleEngine::new();
        let page = words(&["jane@", "example.com"]);
        assert_eq!(rules.classify_page(&page), vec![None, None]);
    }
}
