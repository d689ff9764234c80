//! Transcript builders aligned with [`super::fixtures`].
//!
//! Pages are modelled as rasterized at 72 dpi, so one raster pixel is one
//! PDF point and boxes can be derived from fixture coordinates directly.

use pii_redactor::domain::{
    Category, PageTranscript, PixelBox, Source, TaggedPage, TaggedTranscript, TaggedWord,
    Transcript, Word,
};

pub const RASTER_DPI: u32 = 72;
pub const RASTER_WIDTH: u32 = 595;
pub const RASTER_HEIGHT: u32 = 842;

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Pixel box generously covering a 12 pt line of `chars` characters whose
/// baseline is `y_mm` above the bottom of an A4 page.
pub fn line_box(x_mm: f32, y_mm: f32, chars: usize) -> PixelBox {
    let size = 12.0;
    let baseline = mm_to_pt(super::A4_HEIGHT_MM) - mm_to_pt(y_mm);
    let left = (mm_to_pt(x_mm) - 2.0).max(0.0);
    let top = (baseline - size * 1.1).max(0.0);
    PixelBox::new(
        left as u32,
        top as u32,
        (chars as f32 * size * 0.6 + 4.0) as u32,
        (size * 1.6) as u32,
    )
}

pub fn word(text: &str, bbox: PixelBox) -> Word {
    Word::new(text, bbox, 95.0)
}

pub fn tagged(text: &str, bbox: PixelBox, category: Category) -> TaggedWord {
    TaggedWord::tagged(word(text, bbox), category, Source::Rule)
}

pub fn untagged(text: &str, bbox: PixelBox) -> TaggedWord {
    TaggedWord::untagged(word(text, bbox))
}

pub fn tagged_page(index: usize, words: Vec<TaggedWord>) -> TaggedPage {
    TaggedPage {
        index,
        width: RASTER_WIDTH,
        height: RASTER_HEIGHT,
        dpi: RASTER_DPI,
        words,
    }
}

pub fn tagged_transcript(pages: Vec<TaggedPage>) -> TaggedTranscript {
    TaggedTranscript {
        pages,
        ..Default::default()
    }
}

/// Single page of untagged words, one box per word, laid out on one line.
pub fn transcript_of(texts: &[&str]) -> Transcript {
    let words = texts
        .iter()
        .enumerate()
        .map(|(i, t)| word(t, PixelBox::new(20 + i as u32 * 60, 100, 50, 14)))
        .collect();
    Transcript {
        pages: vec![PageTranscript {
            index: 0,
            width: RASTER_WIDTH,
            height: RASTER_HEIGHT,
            dpi: RASTER_DPI,
            words,
        }],
    }
}

/// Tagged transcript that flags the whole contact line of
/// [`super::create_contact_sheet`] as an email.
pub fn contact_sheet_tagging() -> TaggedTranscript {
    tagged_transcript(vec![tagged_page(
        0,
        vec![
            tagged(
                "jane@example.com",
                line_box(20.0, 250.0, super::CONTACT_LINE.len()),
                Category::Email,
            ),
            untagged("Invoice", line_box(20.0, 200.0, 7)),
        ],
    )])
}
