//! Domain models and business logic for PII detection.
//!
//! This module holds the data exchanged between pipeline stages
//! (transcripts, categories, geometry) and the deterministic pattern
//! matchers the rule pass is built from.

pub mod category;
pub mod credential;
pub mod email;
pub mod geometry;
pub mod id_number;
pub mod ip;
pub mod phone;
pub mod transcript;

pub use category::{Category, Source};
pub use credential::CredentialMatcher;
pub use email::EmailMatcher;
pub use geometry::{map_to_page, PixelSize, Rect};
pub use id_number::IdNumberMatcher;
pub use ip::IpAddressMatcher;
pub use phone::PhoneNumberMatcher;
pub use transcript::{
    ClassificationStatus, PageTranscript, PixelBox, TaggedPage, TaggedTranscript, TaggedWord,
    Transcript, Word,
};

use regex::Regex;
use std::ops::Range;

/// A deterministic detector for one PII category.
pub trait PatternMatcher: Send + Sync {
    /// Category assigned to every match.
    fn category(&self) -> Category;

    fn pattern(&self) -> &Regex;

    /// Checks a regex candidate against rules the regex cannot express.
    fn validate(&self, _candidate: &str) -> bool {
        true
    }

    /// Checks the match at `range` of `text`, where the surrounding
    /// characters are still visible.
    fn validate_in(&self, text: &str, range: Range<usize>) -> bool {
        self.validate(&text[range])
    }

    /// Whether a match may span several adjacent OCR tokens.
    fn spans_tokens(&self) -> bool {
        false
    }

    /// Byte ranges of every validated match in `text`.
    fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.pattern()
            .find_iter(text)
            .filter(|m| self.validate_in(text, m.range()))
            .map(|m| m.range())
            .collect()
    }

    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.find_spans(text)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    fn is_match(&self, text: &str) -> bool {
        self.pattern()
            .find_iter(text)
            .any(|m| self.validate_in(text, m.range()))
    }
}
