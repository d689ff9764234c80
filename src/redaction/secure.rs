//! Secure redaction strategy using MuPDF.
//!
//! Content is removed with MuPDF's redaction API: glyphs under a box are
//! deleted from the content stream and image pixels under it are blanked.
//! MuPDF draws nothing in their place, so the written file is passed through
//! [`overlay::finalize`], which paints the opaque boxes, stamps labels and
//! drops orphaned objects.

use super::overlay;
use super::plan::RedactionPlan;
use super::strategy::{LabelStyle, RedactionResult, RedactionStrategy};
use crate::domain::Rect;
use crate::error::{RedactionError, RedactorError, RedactorResult};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::Rect as MuRect;

/// Secure redaction strategy that physically removes content using MuPDF.
///
/// **Security**: redacted text cannot be extracted from the output and image
/// pixels under a box are overwritten.
#[derive(Debug, Clone, Default)]
pub struct SecureRedactionStrategy;

impl SecureRedactionStrategy {
    pub fn new() -> Self {
        Self
    }

    fn open(input: &Path) -> Result<PdfDocument, RedactionError> {
        let unreadable = |reason: String| RedactionError::Unreadable {
            path: input.to_path_buf(),
            reason,
        };
        let input_str = input
            .to_str()
            .ok_or_else(|| unreadable("path contains invalid UTF-8".to_string()))?;
        PdfDocument::open(input_str).map_err(|e| unreadable(e.to_string()))
    }

    fn page_count(input: &Path, doc: &PdfDocument) -> Result<usize, RedactionError> {
        doc.page_count()
            .map(|n| n.max(0) as usize)
            .map_err(|e| RedactionError::Unreadable {
                path: input.to_path_buf(),
                reason: format!("cannot count pages: {}", e),
            })
    }

    /// Creates one redaction annotation per box and applies them page by page.
    fn burn_in(&self, doc: &PdfDocument, plan: &RedactionPlan) -> Result<usize, RedactionError> {
        let mut applied = 0;

        for page in &plan.pages {
            let number = page.page + 1;
            let apply_failed = |reason: String| RedactionError::Apply {
                page: number,
                reason,
            };

            let loaded = doc
                .load_page(page.page as i32)
                .map_err(|e| apply_failed(e.to_string()))?;
            let mut pdf_page = PdfPage::try_from(loaded)
                .map_err(|e| apply_failed(format!("not a PDF page: {}", e)))?;

            for b in &page.boxes {
                let annot = pdf_page
                    .create_annotation(PdfAnnotationType::Redact)
                    .map_err(|e| apply_failed(format!("cannot create annotation: {}", e)))?;
                let rect = MuRect {
                    x0: b.rect.x0,
                    y0: b.rect.y0,
                    x1: b.rect.x1,
                    y1: b.rect.y1,
                };
                unsafe {
                    ffi::set_annotation_rect(&annot, rect);
                }
            }

            pdf_page
                .redact()
                .map_err(|e| apply_failed(e.to_string()))?;
            debug!("page {}: burned in {} boxes", number, page.boxes.len());
            applied += page.boxes.len();
        }

        Ok(applied)
    }
}

/// Scratch file next to `output`, so the final rename stays on one
/// filesystem.
fn scratch_for(output: &Path) -> Result<NamedTempFile, RedactionError> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".pii-redactor-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .map_err(|e| RedactionError::Unwritable {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })
}

fn persist(file: NamedTempFile, output: &Path) -> Result<(), RedactionError> {
    file.persist(output)
        .map(|_| ())
        .map_err(|e| RedactionError::Unwritable {
            path: output.to_path_buf(),
            reason: e.error.to_string(),
        })
}

impl RedactionStrategy for SecureRedactionStrategy {
    fn page_bounds(&self, input: &Path) -> RedactorResult<Vec<Rect>> {
        let doc = Self::open(input)?;
        let total = Self::page_count(input, &doc)?;

        let mut bounds = Vec::with_capacity(total);
        for index in 0..total {
            let b = doc
                .load_page(index as i32)
                .and_then(|page| page.bounds())
                .map_err(|e| RedactionError::Unreadable {
                    path: input.to_path_buf(),
                    reason: format!("page {}: {}", index + 1, e),
                })?;
            bounds.push(Rect::new(b.x0, b.y0, b.x1, b.y1));
        }
        Ok(bounds)
    }

    fn apply(
        &self,
        input: &Path,
        output: &Path,
        plan: &RedactionPlan,
        style: Option<LabelStyle>,
    ) -> RedactorResult<RedactionResult> {
        let doc = Self::open(input)?;
        let total = Self::page_count(input, &doc)?;
        if let Some(page) = plan.pages.iter().find(|p| p.page >= total) {
            return Err(RedactionError::PageOutOfRange {
                page: page.page,
                total,
            }
            .into());
        }

        // Nothing to burn in: the output is a byte copy.
        if plan.is_empty() {
            let scratch = scratch_for(output)?;
            std::fs::copy(input, scratch.path()).map_err(|e| RedactionError::Unwritable {
                path: output.to_path_buf(),
                reason: e.to_string(),
            })?;
            persist(scratch, output)?;
            return Ok(RedactionResult {
                pages_processed: total,
                secure: true,
                ..Default::default()
            });
        }

        let applied = self.burn_in(&doc, plan)?;

        let saved = scratch_for(output)?;
        let saved_str = saved.path().to_str().ok_or_else(|| RedactorError::InvalidInput {
            parameter: "output".to_string(),
            reason: "Path contains invalid UTF-8".to_string(),
        })?;
        doc.save(saved_str).map_err(|e| RedactionError::Unwritable {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;

        let finished = scratch_for(output)?;
        let labels_drawn = overlay::finalize(saved.path(), finished.path(), plan, style)?;
        persist(finished, output)?;

        Ok(RedactionResult {
            boxes_applied: applied,
            pages_processed: total,
            pages_modified: plan.pages.len(),
            labels_drawn,
            secure: true,
        })
    }

    fn extract_text(&self, input: &Path) -> RedactorResult<String> {
        let bytes = std::fs::read(input).map_err(|e| RedactorError::io(input, e))?;

        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| RedactorError::TextExtraction {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &str {
        "SecureRedaction"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle of a PDF annotation.
    ///
    /// # Safety
    /// `annot` must be a live annotation of a loaded page.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();
        if ctx.is_null() {
            return;
        }

        let fz_rect = mupdf_sys::fz_rect {
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
        };
        mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
        mupdf_sys::mupdf_drop_base_context(ctx);
    }
}
