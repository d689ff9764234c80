//! Redaction strategy trait and supporting types.
//!
//! This module defines the seam between redaction planning and the PDF
//! backend that burns boxes into a document.

use super::plan::RedactionPlan;
use crate::domain::Rect;
use crate::error::RedactorResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How category labels are drawn inside boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    /// Largest font size used; labels shrink to fit small boxes.
    pub font_size: f32,
}

/// Statistics about a redaction operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionResult {
    /// Boxes burned into the document.
    pub boxes_applied: usize,

    /// Pages in the document.
    pub pages_processed: usize,

    /// Pages with at least one box.
    pub pages_modified: usize,

    /// Labels drawn.
    pub labels_drawn: usize,

    /// Whether content under the boxes was removed (vs visually obscured).
    pub secure: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.boxes_applied > 0
    }
}

/// Backend that reads page geometry and burns a [`RedactionPlan`] into a
/// document.
pub trait RedactionStrategy: Send + Sync {
    /// Native bounds of every page, in page order.
    fn page_bounds(&self, input: &Path) -> RedactorResult<Vec<Rect>>;

    /// Writes a copy of `input` to `output` with every planned box applied.
    ///
    /// Implementations must not leave a partially redacted file at `output`
    /// when they fail.
    fn apply(
        &self,
        input: &Path,
        output: &Path,
        plan: &RedactionPlan,
        labels: Option<LabelStyle>,
    ) -> RedactorResult<RedactionResult>;

    /// Extracts the text layer of a PDF.
    fn extract_text(&self, input: &Path) -> RedactorResult<String>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;

    /// Returns whether this strategy removes the underlying content.
    fn is_secure(&self) -> bool;
}
