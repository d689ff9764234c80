//! Transcript artifacts exchanged between pipeline stages.
//!
//! [`Transcript`] is what the extractor persists; [`TaggedTranscript`] is the
//! same page/word structure after classification. Both serialize to JSON and
//! are validated on load, so each stage can be re-run from disk.

use super::category::{Category, Source};
use super::geometry::{PixelSize, Rect};
use crate::artifact::{load_json, save_json};
use crate::error::{ClassificationDegraded, RedactorError, RedactorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Word bounding box in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::from_xywh(
            self.left as f32,
            self.top as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// One optically recognized token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: PixelBox,
    /// Recognition confidence, 0–100.
    pub confidence: f32,
    /// Ordinal of the OCR text line the word belongs to.
    #[serde(default)]
    pub line: u32,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: PixelBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: confidence.clamp(0.0, 100.0),
            line: 0,
        }
    }

    pub fn on_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

/// All words recognized on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTranscript {
    /// 0-based page index in the source document.
    pub index: usize,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Rasterization resolution.
    pub dpi: u32,
    pub words: Vec<Word>,
}

impl PageTranscript {
    pub fn pixel_size(&self) -> PixelSize {
        PixelSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Persisted transcript of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub pages: Vec<PageTranscript>,
}

impl Transcript {
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.words.len()).sum()
    }

    /// Checks the structural invariants every consumer relies on.
    pub fn validate(&self) -> RedactorResult<()> {
        validate_pages(self.pages.iter().map(|p| (p.index, p.width, p.height, p.dpi)))
    }

    /// Plain-text rendering, one block per page, one line per OCR line.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            out.push_str(&format!("\n===== Page {} =====\n", page.index + 1));
            let mut current_line = None;
            for word in &page.words {
                match current_line {
                    Some(line) if line == word.line => out.push(' '),
                    Some(_) => out.push('\n'),
                    None => {}
                }
                out.push_str(&word.text);
                current_line = Some(word.line);
            }
            out.push('\n');
        }
        out
    }

    pub fn load(path: &Path) -> RedactorResult<Self> {
        let transcript: Self = load_json(path)?;
        transcript.validate()?;
        Ok(transcript)
    }

    pub fn save(&self, path: &Path) -> RedactorResult<()> {
        save_json(path, self)
    }
}

/// A word after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedWord {
    #[serde(flatten)]
    pub word: Word,
    pub category: Category,
    /// Detection source; absent when the category is `none`.
    #[serde(default)]
    pub source: Option<Source>,
}

impl TaggedWord {
    pub fn untagged(word: Word) -> Self {
        Self {
            word,
            category: Category::None,
            source: None,
        }
    }

    pub fn tagged(word: Word, category: Category, source: Source) -> Self {
        if category.is_none() {
            return Self::untagged(word);
        }
        Self {
            word,
            category,
            source: Some(source),
        }
    }

    pub fn is_pii(&self) -> bool {
        self.category.is_pii()
    }
}

/// A page of the tagged transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedPage {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub words: Vec<TaggedWord>,
}

impl TaggedPage {
    pub fn pixel_size(&self) -> PixelSize {
        PixelSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn flagged(&self) -> impl Iterator<Item = (usize, &TaggedWord)> {
        self.words.iter().enumerate().filter(|(_, w)| w.is_pii())
    }
}

/// How the classification run went.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationStatus {
    /// Name of the inference backend, `None` when the contextual pass was off.
    #[serde(default)]
    pub inference: Option<String>,
    #[serde(default)]
    pub total_batches: usize,
    #[serde(default)]
    pub failed_batches: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<ClassificationDegraded>,
}

/// Persisted classifier output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedTranscript {
    pub pages: Vec<TaggedPage>,
    #[serde(default)]
    pub classification: ClassificationStatus,
}

impl TaggedTranscript {
    pub fn validate(&self) -> RedactorResult<()> {
        validate_pages(self.pages.iter().map(|p| (p.index, p.width, p.height, p.dpi)))
    }

    pub fn degraded(&self) -> Option<&ClassificationDegraded> {
        self.classification.degraded.as_ref()
    }

    pub fn flagged_count(&self) -> usize {
        self.pages.iter().map(|p| p.flagged().count()).sum()
    }

    /// Clears every category not in `keep`, so the redactor only sees the
    /// selected ones.
    pub fn retain_categories(&mut self, keep: &[Category]) {
        for word in self.pages.iter_mut().flat_map(|p| p.words.iter_mut()) {
            if word.is_pii() && !keep.contains(&word.category) {
                word.category = Category::None;
                word.source = None;
            }
        }
    }

    pub fn load(path: &Path) -> RedactorResult<Self> {
        let tagged: Self = load_json(path)?;
        tagged.validate()?;
        Ok(tagged)
    }

    pub fn save(&self, path: &Path) -> RedactorResult<()> {
        save_json(path, self)
    }
}

fn validate_pages(pages: impl Iterator<Item = (usize, u32, u32, u32)>) -> RedactorResult<()> {
    let mut seen = HashSet::new();
    for (index, width, height, dpi) in pages {
        if !seen.insert(index) {
            return Err(RedactorError::artifact(format!(
                "page {} appears more than once",
                index
            )));
        }
        if width == 0 || height == 0 {
            return Err(RedactorError::artifact(format!(
                "page {} has empty pixel dimensions {}x{}",
                index, width, height
            )));
        }
        if dpi == 0 {
            return Err(RedactorError::artifact(format!(
                "page {} has no rasterization resolution",
                index
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, words: Vec<Word>) -> PageTranscript {
        PageTranscript {
            index,
            width: 1000,
            height: 1300,
            dpi: 100,
            words,
        }
    }

    #[test]
    fn test_duplicate_page_rejected() {
        let transcript = Transcript {
            pages: vec![page(0, vec![]), page(0, vec![])],
        };
        assert!(matches!(
            transcript.validate(),
            Err(RedactorError::Artifact { .. })
        ));
    }

    #[test]
    fn test_plain_text_lines() {
        let b = PixelBox::new(0, 0, 1, 1);
        let transcript = Transcript {
            pages: vec![page(
                0,
                vec![
                    Word::new("Hello", b, 90.0).on_line(0),
                    Word::new("world", b, 90.0).on_line(0),
                    Word::new("Bye", b, 90.0).on_line(1),
                ],
            )],
        };
        assert_eq!(
            transcript.plain_text(),
            "\n===== Page 1 =====\nHello world\nBye\n"
        );
    }

    #[test]
    fn test_tagged_word_flattens() {
        let word = Word::new("a@b.io", PixelBox::new(1, 2, 3, 4), 88.0);
        let tagged = TaggedWord::tagged(word, Category::Email, Source::Rule);
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["text"], "a@b.io");
        assert_eq!(json["category"], "email");
        assert_eq!(json["source"], "rule");
        assert_eq!(json["bbox"]["left"], 1);
    }

    #[test]
    fn test_none_category_has_no_source() {
        let word = Word::new("hello", PixelBox::new(0, 0, 1, 1), 50.0);
        let tagged = TaggedWord::tagged(word, Category::None, Source::Inference);
        assert!(tagged.source.is_none());
    }
}
