//! Page rasterization with MuPDF.

use crate::error::ExtractionError;
use image::{ImageFormat, RgbImage};
use mupdf::{Colorspace, Document, Matrix};
use std::path::{Path, PathBuf};

/// One rendered page written to disk.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub index: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Renders the pages of one document at a fixed resolution.
pub struct Rasterizer {
    document: Document,
    dpi: u32,
}

impl Rasterizer {
    pub fn open(path: &Path, dpi: u32) -> Result<Self, ExtractionError> {
        let unreadable = |reason: String| ExtractionError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };
        let path_str = path
            .to_str()
            .ok_or_else(|| unreadable("path contains invalid UTF-8".to_string()))?;
        let document = Document::open(path_str).map_err(|e| unreadable(e.to_string()))?;
        Ok(Self { document, dpi })
    }

    pub fn page_count(&self) -> Result<usize, ExtractionError> {
        self.document
            .page_count()
            .map(|n| n.max(0) as usize)
            .map_err(|e| ExtractionError::Rasterization {
                page: 0,
                reason: format!("cannot count pages: {}", e),
            })
    }

    /// Renders page `index` (0-based) as an RGB PNG inside `dir`.
    pub fn render(&self, index: usize, dir: &Path) -> Result<RenderedPage, ExtractionError> {
        let failed = |reason: String| ExtractionError::Rasterization {
            page: index + 1,
            reason,
        };

        let page = self
            .document
            .load_page(index as i32)
            .map_err(|e| failed(e.to_string()))?;
        let zoom = self.dpi as f32 / 72.0;
        let pixmap = page
            .to_pixmap(
                &Matrix::new_scale(zoom, zoom),
                &Colorspace::device_rgb(),
                false,
                false,
            )
            .map_err(|e| failed(e.to_string()))?;

        let width = pixmap.width();
        let height = pixmap.height();
        let image = to_rgb(
            pixmap.samples(),
            width,
            height,
            pixmap.n() as usize,
            pixmap.stride() as usize,
        )
        .ok_or_else(|| failed("pixmap has an unexpected sample layout".to_string()))?;

        let path = dir.join(format!("page-{:04}.png", index + 1));
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| failed(e.to_string()))?;

        Ok(RenderedPage {
            index,
            path,
            width,
            height,
        })
    }
}

/// Packs MuPDF samples (`n` components per pixel, `stride` bytes per row)
/// into a tightly packed RGB image.
fn to_rgb(samples: &[u8], width: u32, height: u32, n: usize, stride: usize) -> Option<RgbImage> {
    let (w, h) = (width as usize, height as usize);
    if n < 3 || stride < w * n || samples.len() < stride * h.saturating_sub(1) + w * n {
        return None;
    }

    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let line = &samples[row * stride..row * stride + w * n];
        for pixel in line.chunks_exact(n) {
            rgb.extend_from_slice(&pixel[..3]);
        }
    }
    RgbImage::from_raw(width, height, rgb)
}
