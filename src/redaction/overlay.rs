//! Post-redaction pass over the written document with lopdf.
//!
//! MuPDF removes what lies under each box but paints nothing in its place.
//! This pass fills every planned box with opaque black, optionally stamps the
//! category label in white on top, and prunes every object no longer
//! reachable from the trailer so the original glyph runs do not survive in
//! the file.

use super::plan::{PageRedactions, RedactionPlan};
use super::strategy::LabelStyle;
use crate::domain::Rect;
use crate::error::RedactionError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// Resource name of the label font.
pub const LABEL_FONT: &str = "PiiRedactorLabel";

/// Smallest font size worth drawing.
const MIN_LABEL_SIZE: f32 = 2.0;

/// Average Helvetica capital advance, in em.
const CAP_ADVANCE: f32 = 0.67;

/// Loads `src`, paints the boxes of `plan` (with labels when requested),
/// prunes unreachable objects and writes the result to `dst`. Returns the
/// number of labels drawn.
pub fn finalize(
    src: &Path,
    dst: &Path,
    plan: &RedactionPlan,
    labels: Option<LabelStyle>,
) -> Result<usize, RedactionError> {
    let mut doc = Document::load(src).map_err(|e| RedactionError::Unreadable {
        path: src.to_path_buf(),
        reason: e.to_string(),
    })?;

    let drawn = paint(&mut doc, plan, labels)?;

    doc.prune_objects();
    doc.compress();
    doc.save(dst).map_err(|e| RedactionError::Unwritable {
        path: dst.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(drawn)
}

/// Fills every box of `plan` and draws its label when `labels` is set.
/// Returns the number of labels drawn.
fn paint(
    doc: &mut Document,
    plan: &RedactionPlan,
    labels: Option<LabelStyle>,
) -> Result<usize, RedactionError> {
    let page_ids = doc.get_pages();
    let font_id = labels.map(|_| {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        })
    });

    let mut drawn = 0;
    for page in &plan.pages {
        let page_id = *page_ids
            .get(&(page.page as u32 + 1))
            .ok_or(RedactionError::PageOutOfRange {
                page: page.page,
                total: page_ids.len(),
            })?;
        let apply_failed = |reason: String| RedactionError::Apply {
            page: page.page + 1,
            reason,
        };

        let content = page_overlay(page, visible_box(doc, page_id), labels);
        if content.bytes.is_empty() {
            continue;
        }
        if let (Some(font_id), true) = (font_id, content.labels > 0) {
            attach_font(doc, page_id, font_id).map_err(apply_failed)?;
        }
        wrap_contents(doc, page_id, content.bytes).map_err(apply_failed)?;
        drawn += content.labels;
    }
    Ok(drawn)
}

struct PageOverlay {
    bytes: Vec<u8>,
    labels: usize,
}

/// Box rectangle in PDF user space as `(x, y, width, height)`, lower-left
/// origin. `visible` is the page's CropBox (or MediaBox) as
/// `[llx, lly, urx, ury]`.
fn to_user_space(rect: &Rect, bounds: &Rect, visible: [f32; 4]) -> (f32, f32, f32, f32) {
    let [llx, _, _, ury] = visible;
    (
        llx + (rect.x0 - bounds.x0),
        ury - (rect.y1 - bounds.y0),
        rect.width(),
        rect.height(),
    )
}

/// Builds the fill and text operators for one page.
fn page_overlay(
    page: &PageRedactions,
    visible: [f32; 4],
    labels: Option<LabelStyle>,
) -> PageOverlay {
    let mut bytes = Vec::new();
    let mut drawn = 0;

    for b in &page.boxes {
        let (x, y, w, h) = to_user_space(&b.rect, &page.bounds, visible);
        bytes.extend_from_slice(
            format!("0 0 0 rg {:.2} {:.2} {:.2} {:.2} re f\n", x, y, w, h).as_bytes(),
        );

        let Some(style) = labels else {
            continue;
        };
        let text = b.category.label();
        let Some(size) = fit_font_size(&b.rect, text, style.font_size) else {
            continue;
        };
        let text_width = size * CAP_ADVANCE * text.len() as f32;
        let tx = x + (w - text_width) / 2.0;
        // Baseline sits a little below the vertical centre of cap height.
        let ty = y + (h - size * 0.7) / 2.0;

        bytes.extend_from_slice(
            format!(
                "BT /{} {:.2} Tf 1 1 1 rg {:.2} {:.2} Td ({}) Tj ET\n",
                LABEL_FONT,
                size,
                tx,
                ty,
                escape(text)
            )
            .as_bytes(),
        );
        drawn += 1;
    }

    PageOverlay {
        bytes,
        labels: drawn,
    }
}

/// Largest size up to `max` at which `text` fits inside `rect`.
fn fit_font_size(rect: &Rect, text: &str, max: f32) -> Option<f32> {
    if text.is_empty() {
        return None;
    }
    let by_width = rect.width() * 0.9 / (CAP_ADVANCE * text.len() as f32);
    let by_height = rect.height() * 0.9;
    let size = max.min(by_width).min(by_height);
    (size >= MIN_LABEL_SIZE).then_some(size)
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Looks `key` up on the page, then on its ancestors.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn visible_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let read = |key: &[u8]| -> Option<[f32; 4]> {
        let array = resolve(doc, inherited(doc, page_id, key)?).as_array().ok()?;
        let mut values = [0.0f32; 4];
        for (slot, value) in values.iter_mut().zip(array.iter()) {
            *slot = resolve(doc, value).as_float().ok()?;
        }
        (array.len() == 4).then_some([
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ])
    };
    read(b"CropBox")
        .or_else(|| read(b"MediaBox"))
        .unwrap_or([0.0, 0.0, 612.0, 792.0])
}

/// Gives the page its own copy of its resources with the label font added.
fn attach_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<(), String> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|r| resolve(doc, r).as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|f| resolve(doc, f).as_dict().ok())
        .cloned()
        .unwrap_or_default();
    fonts.set(LABEL_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Brackets the existing content in `q`/`Q` and appends `extra`, so the
/// overlay draws with a clean graphics state.
fn wrap_contents(doc: &mut Document, page_id: ObjectId, extra: Vec<u8>) -> Result<(), String> {
    let existing: Vec<Object> = match doc
        .get_dictionary(page_id)
        .map_err(|e| e.to_string())?
        .get(b"Contents")
    {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    };

    let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut tail = b"Q\n".to_vec();
    tail.extend(extra);
    let close = doc.add_object(Stream::new(Dictionary::new(), tail));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend(existing);
    contents.push(Object::Reference(close));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, String> {
    match doc.get_object_mut(page_id).map_err(|e| e.to_string())? {
        Object::Dictionary(dict) => Ok(dict),
        _ => Err(format!("object {:?} is not a page dictionary", page_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::redaction::RedactionBox;

    #[test]
    fn test_fit_font_size() {
        let wide = Rect::new(0.0, 0.0, 200.0, 20.0);
        assert_eq!(fit_font_size(&wide, "NAME", 8.0), Some(8.0));

        let narrow = Rect::new(0.0, 0.0, 12.0, 20.0);
        let size = fit_font_size(&narrow, "EMAIL", 8.0).unwrap_or(0.0);
        assert!(size < 8.0);

        let tiny = Rect::new(0.0, 0.0, 2.0, 1.0);
        assert_eq!(fit_font_size(&tiny, "SECRET", 8.0), None);
    }

    fn one_box(category: Category) -> PageRedactions {
        PageRedactions {
            page: 0,
            bounds: Rect::new(0.0, 0.0, 612.0, 792.0),
            boxes: vec![RedactionBox {
                page: 0,
                rect: Rect::new(54.0, 120.0, 274.0, 139.0),
                category,
                words: 1,
            }],
        }
    }

    #[test]
    fn test_boxes_are_filled_without_labels() {
        let overlay = page_overlay(&one_box(Category::Email), [0.0, 0.0, 612.0, 792.0], None);
        let content = String::from_utf8(overlay.bytes).unwrap();

        assert_eq!(overlay.labels, 0);
        assert!(content.contains("0 0 0 rg 54.00 653.00 220.00 19.00 re f"));
        assert!(!content.contains("BT"));
    }

    #[test]
    fn test_label_is_drawn_over_the_fill() {
        let style = LabelStyle { font_size: 8.0 };
        let overlay = page_overlay(
            &one_box(Category::Email),
            [0.0, 0.0, 612.0, 792.0],
            Some(style),
        );
        let content = String::from_utf8(overlay.bytes).unwrap();

        assert_eq!(overlay.labels, 1);
        let fill = content.find("re f").unwrap();
        let text = content.find("(EMAIL) Tj").unwrap();
        assert!(fill < text);
    }

    #[test]
    fn test_fill_follows_crop_box_origin() {
        let overlay = page_overlay(&one_box(Category::Ip), [10.0, 20.0, 622.0, 812.0], None);
        let content = String::from_utf8(overlay.bytes).unwrap();
        assert!(content.contains("64.00 673.00 220.00 19.00 re f"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a(b)\\"), "a\\(b\\)\\\\");
    }
}
