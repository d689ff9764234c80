//! Redaction report written next to the redacted document.

use crate::artifact::{load_json, save_json};
use crate::domain::{Category, PixelBox, Source, TaggedPage, TaggedTranscript};
use crate::error::{ClassificationDegraded, RedactorResult};
use crate::redaction::RedactionPlan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Words of context kept on each side of a flagged word.
pub const CONTEXT_WORDS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Flagged words.
    pub total: usize,
    /// Boxes drawn after merging.
    pub boxes: usize,
    pub by_category: BTreeMap<Category, usize>,
    /// Flagged words per 1-based page number.
    pub by_page: BTreeMap<usize, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<ClassificationDegraded>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One flagged word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    /// 1-based page number.
    pub page: usize,
    /// Word index within the page.
    pub index: usize,
    pub category: Category,
    #[serde(default)]
    pub source: Option<Source>,
    pub text: String,
    pub confidence: f32,
    pub bbox: PixelBox,
    pub page_width: u32,
    pub page_height: u32,
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionReport {
    pub summary: ReportSummary,
    pub items: Vec<ReportItem>,
}

impl RedactionReport {
    pub fn build(tagged: &TaggedTranscript, plan: &RedactionPlan) -> Self {
        let mut summary = ReportSummary {
            boxes: plan.box_count(),
            degraded: tagged.degraded().cloned(),
            ..Default::default()
        };
        let mut items = Vec::new();

        for page in &tagged.pages {
            for (index, word) in page.flagged() {
                summary.total += 1;
                *summary.by_category.entry(word.category).or_default() += 1;
                *summary.by_page.entry(page.index + 1).or_default() += 1;

                items.push(ReportItem {
                    page: page.index + 1,
                    index,
                    category: word.category,
                    source: word.source,
                    text: word.word.text.clone(),
                    confidence: word.word.confidence,
                    bbox: word.word.bbox,
                    page_width: page.width,
                    page_height: page.height,
                    context: context_of(page, index),
                });
            }
        }

        let mut notes = Vec::new();
        if summary.total == 0 {
            notes.push("no PII detected; output is a copy of the input".to_string());
        }
        if summary.degraded.is_some() {
            notes.push(degraded_note());
        }
        if !notes.is_empty() {
            summary.note = Some(notes.join("; "));
        }
        Self { summary, items }
    }

    pub fn load(path: &Path) -> RedactorResult<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> RedactorResult<()> {
        save_json(path, self)
    }
}

/// Names the categories that were not searched for when inference was
/// unavailable.
fn degraded_note() -> String {
    let missed: Vec<&str> = Category::PII
        .iter()
        .filter(|c| c.is_context_dependent())
        .map(|c| c.as_str())
        .collect();
    format!(
        "classification degraded: rule-only detection cannot find {} values",
        missed.join(" or ")
    )
}

fn context_of(page: &TaggedPage, index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_WORDS);
    let end = (index + CONTEXT_WORDS + 1).min(page.words.len());
    page.words[start..end]
        .iter()
        .map(|w| w.word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaggedWord, Word};

    fn page(words: &[(&str, Category)]) -> TaggedPage {
        TaggedPage {
            index: 1,
            width: 800,
            height: 1000,
            dpi: 100,
            words: words
                .iter()
                .map(|(t, c)| {
                    let word = Word::new(*t, PixelBox::new(0, 0, 10, 10), 90.0);
                    if c.is_pii() {
                        TaggedWord::tagged(word, *c, Source::Rule)
                    } else {
                        TaggedWord::untagged(word)
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn test_summary_counts_and_context() {
        let tagged = TaggedTranscript {
            pages: vec![page(&[
                ("a", Category::None),
                ("b", Category::None),
                ("c", Category::None),
                ("d", Category::None),
                ("jane@x.com", Category::Email),
                ("e", Category::None),
                ("555-867-5309", Category::Phone),
            ])],
            ..Default::default()
        };
        let report = RedactionReport::build(&tagged, &RedactionPlan::default());

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.by_category[&Category::Email], 1);
        assert_eq!(report.summary.by_page[&2], 2);
        assert_eq!(report.items[0].page, 2);
        assert_eq!(report.items[0].index, 4);
        assert_eq!(report.items[0].context, "b c d jane@x.com e 555-867-5309");
        assert_eq!(report.items[1].context, "d jane@x.com e 555-867-5309");
        assert!(report.summary.note.is_none());
    }

    #[test]
    fn test_empty_report_has_note() {
        let report = RedactionReport::build(&TaggedTranscript::default(), &RedactionPlan::default());
        assert_eq!(report.summary.total, 0);
        assert!(report.summary.note.is_some());
    }

    #[test]
    fn test_degraded_report_names_missed_categories() {
        let mut tagged = TaggedTranscript {
            pages: vec![page(&[("jane@x.com", Category::Email)])],
            ..Default::default()
        };
        tagged.classification.degraded = Some(ClassificationDegraded {
            reason: "inference is disabled".to_string(),
            failed_batches: 0,
            total_batches: 0,
        });

        let report = RedactionReport::build(&tagged, &RedactionPlan::default());
        let note = report.summary.note.unwrap_or_default();
        assert!(note.contains("classification degraded"));
        assert!(note.contains("name"));
        assert!(note.contains("address"));
        assert!(!note.contains("no PII detected"));
    }

    #[test]
    fn test_degraded_empty_report_keeps_both_notes() {
        let mut tagged = TaggedTranscript::default();
        tagged.classification.degraded = Some(ClassificationDegraded {
            reason: "timeout".to_string(),
            failed_batches: 1,
            total_batches: 1,
        });

        let note = RedactionReport::build(&tagged, &RedactionPlan::default())
            .summary
            .note
            .unwrap_or_default();
        assert!(note.starts_with("no PII detected"));
        assert!(note.contains("name or address"));
    }
}
