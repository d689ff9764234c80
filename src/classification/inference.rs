//! Contextual-inference contract.
//!
//! The classifier treats the remote tagger as an opaque, fallible capability:
//! it submits a batch of words with a little surrounding text and gets back a
//! category for the ones it considers PII. Everything HTTP-specific lives in
//! the implementations (see [`super::gemini`]).

use crate::domain::{Category, Word};
use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

/// One word submitted for contextual tagging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceItem {
    /// Position of the word within the submitted batch.
    pub index: usize,
    pub text: String,
    /// Adjacent words around (and including) this one.
    pub context: String,
}

/// A category assigned by the service to one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceLabel {
    pub index: usize,
    pub category: Category,
}

/// Remote tagger for context-dependent PII (names, addresses, ...).
pub trait InferenceClient: Send + Sync {
    /// Labels a batch. Items the service leaves out count as `none`.
    fn classify(&self, items: &[InferenceItem]) -> Result<Vec<InferenceLabel>, InferenceError>;

    /// Human-readable backend name recorded in the tagged transcript.
    fn name(&self) -> &str;
}

/// Text of up to `window` non-empty words either side of `index`, with the
/// word itself in the middle.
pub fn context_window(words: &[Word], index: usize, window: usize) -> String {
    let non_empty = |w: &&Word| !w.text.trim().is_empty();

    let mut left: Vec<&str> = words[..index]
        .iter()
        .rev()
        .filter(non_empty)
        .take(window)
        .map(|w| w.text.trim())
        .collect();
    left.reverse();

    let right = words[index + 1..]
        .iter()
        .filter(non_empty)
        .take(window)
        .map(|w| w.text.trim());

    left.into_iter()
        .chain(std::iter::once(words[index].text.trim()))
        .chain(right)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the batch items for `words[range]`, numbering them from zero and
/// drawing context from the whole page.
pub fn build_batch(words: &[Word], range: std::ops::Range<usize>, window: usize) -> Vec<InferenceItem> {
    let start = range.start;
    range
        .map(|i| InferenceItem {
            index: i - start,
            text: words[i].text.clone(),
            context: context_window(words, i, window),
        })
        .collect()
}
