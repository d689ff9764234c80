//! Pixel-space and page-space geometry.
//!
//! OCR reports boxes in the pixel space of a rasterized page; redaction
//! happens in the document's native page space (points, origin top-left,
//! y growing downwards, as MuPDF exposes page bounds). [`map_to_page`] is the
//! single place where one is converted into the other.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle given by its corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle from a top-left origin and a size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Overlapping region; may be empty.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(
            self.x0 - margin,
            self.y0 - margin,
            self.x1 + margin,
            self.y1 + margin,
        )
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Height of the shared vertical band; zero or negative when disjoint.
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        self.y1.min(other.y1) - self.y0.max(other.y0)
    }

    /// Horizontal distance between the two; negative when they overlap.
    pub fn horizontal_gap(&self, other: &Rect) -> f32 {
        (other.x0 - self.x1).max(self.x0 - other.x1)
    }
}

/// Dimensions of a rasterized page in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// Maps a rectangle in raster pixel space onto the native page rectangle.
///
/// Each axis is scaled independently by `page / pixels`, so a raster whose
/// aspect ratio drifted from the page's (rounding in the rasterizer) still
/// lands on the right spot. `page` may have a non-zero origin.
pub fn map_to_page(pixel: &Rect, pixels: PixelSize, page: &Rect) -> Rect {
    let sx = page.width() / pixels.width.max(1) as f32;
    let sy = page.height() / pixels.height.max(1) as f32;
    Rect::new(
        page.x0 + pixel.x0 * sx,
        page.y0 + pixel.y0 * sy,
        page.x0 + pixel.x1 * sx,
        page.y0 + pixel.y1 * sy,
    )
}
