//! Redaction planning: tagged words → page-space boxes.
//!
//! Planning is pure. It takes the tagged transcript and the native bounds of
//! every document page and produces the exact rectangles the strategy will
//! burn in, so placement can be inspected and tested without touching a PDF
//! backend.

use crate::config::RedactionConfig;
use crate::domain::{map_to_page, Category, Rect, TaggedTranscript};
use crate::error::RedactionError;
use serde::Serialize;
use std::collections::BTreeMap;

/// An opaque rectangle covering one or more same-category words.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactionBox {
    /// 0-based page index.
    pub page: usize,
    /// Page-space rectangle, top-left origin.
    pub rect: Rect,
    pub category: Category,
    /// Number of words merged into this box.
    pub words: usize,
}

/// Boxes for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRedactions {
    pub page: usize,
    /// Native page bounds the boxes were mapped into.
    pub bounds: Rect,
    pub boxes: Vec<RedactionBox>,
}

/// Complete placement for a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RedactionPlan {
    /// Pages with at least one box, in page order.
    pub pages: Vec<PageRedactions>,
}

impl RedactionPlan {
    pub fn box_count(&self) -> usize {
        self.pages.iter().map(|p| p.boxes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.box_count() == 0
    }

    pub fn boxes(&self) -> impl Iterator<Item = &RedactionBox> {
        self.pages.iter().flat_map(|p| p.boxes.iter())
    }

    pub fn page(&self, index: usize) -> Option<&PageRedactions> {
        self.pages.iter().find(|p| p.page == index)
    }
}

/// Maps every flagged word into page space and merges neighbours.
///
/// Fails before producing anything when a transcript page has no
/// counterpart among `page_bounds`.
pub fn plan_redactions(
    tagged: &TaggedTranscript,
    page_bounds: &[Rect],
    config: &RedactionConfig,
) -> Result<RedactionPlan, RedactionError> {
    if let Some(page) = tagged.pages.iter().find(|p| p.index >= page_bounds.len()) {
        return Err(RedactionError::PageOutOfRange {
            page: page.index,
            total: page_bounds.len(),
        });
    }

    let mut pages: Vec<PageRedactions> = Vec::new();
    for page in &tagged.pages {
        let bounds = page_bounds[page.index];

        let mut by_category: BTreeMap<Category, Vec<Rect>> = BTreeMap::new();
        for (_, word) in page.flagged() {
            let pixel = word.word.bbox.to_rect().expand(config.padding_px);
            let mapped = map_to_page(&pixel, page.pixel_size(), &bounds).intersect(&bounds);
            if !mapped.is_empty() {
                by_category.entry(word.category).or_default().push(mapped);
            }
        }

        let boxes: Vec<RedactionBox> = by_category
            .into_iter()
            .flat_map(|(category, rects)| merge_adjacent(page.index, category, &rects, config.merge_gap))
            .collect();

        if !boxes.is_empty() {
            pages.push(PageRedactions {
                page: page.index,
                bounds,
                boxes,
            });
        }
    }

    pages.sort_by_key(|p| p.page);
    Ok(RedactionPlan { pages })
}

/// Whether `next` continues the run covered by `open`.
pub fn is_adjacent(open: &Rect, next: &Rect, gap: f32) -> bool {
    open.vertical_overlap(next) > 0.0 && open.horizontal_gap(next) <= gap
}

/// Single pass over same-category rectangles in transcript order: each one
/// either extends the open box or closes it and opens a new one.
pub fn merge_adjacent(page: usize, category: Category, rects: &[Rect], gap: f32) -> Vec<RedactionBox> {
    let mut boxes = Vec::new();
    let mut open: Option<RedactionBox> = None;

    for rect in rects {
        match open.as_mut() {
            Some(current) if is_adjacent(&current.rect, rect, gap) => {
                current.rect = current.rect.union(rect);
                current.words += 1;
            }
            _ => {
                boxes.extend(open.take());
                open = Some(RedactionBox {
                    page,
                    rect: *rect,
                    category,
                    words: 1,
                });
            }
        }
    }
    boxes.extend(open);
    boxes
}
