//! Arbitration between detection sources.

use crate::domain::{Category, Source};

/// One source's opinion about a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub source: Source,
    pub category: Category,
}

impl Candidate {
    pub fn new(source: Source, category: Category) -> Self {
        Self { source, category }
    }
}

/// Folds candidates to the highest-priority non-`none` category.
///
/// Candidates are ranked by [`Source::priority`], so the deterministic rule
/// pass always beats inference when both fire; a single firing source wins
/// outright. Returns `(Category::None, None)` when nothing fired.
pub fn arbitrate(candidates: &[Candidate]) -> (Category, Option<Source>) {
    let mut ranked = candidates.to_vec();
    ranked.sort_by_key(|c| c.source.priority());
    ranked
        .into_iter()
        .fold(None, |winner, c| {
            winner.or_else(|| c.category.is_pii().then_some((c.category, c.source)))
        })
        .map_or((Category::None, None), |(category, source)| {
            (category, Some(source))
        })
}
