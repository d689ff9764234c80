//! Tesseract OCR through its command-line interface.
//!
//! The engine is invoked once per rendered page with TSV output, which
//! carries one row per recognized word together with its pixel box, its
//! confidence and the block/paragraph/line it belongs to.

use super::OcrEngine;
use crate::config::ExtractionConfig;
use crate::domain::{PixelBox, Word};
use crate::error::ExtractionError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// TSV row level of a single word.
const WORD_LEVEL: u32 = 5;

pub struct TesseractEngine {
    executable: PathBuf,
    language: String,
    psm: u8,
    dpi: u32,
}

impl TesseractEngine {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            executable: config.tesseract_path.clone(),
            language: config.language.clone(),
            psm: config.page_segmentation_mode,
            dpi: config.dpi,
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> ExtractionError {
        ExtractionError::OcrUnavailable {
            engine: self.executable.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn ensure_available(&self) -> Result<(), ExtractionError> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .output()
            .map_err(|e| self.unavailable(e.to_string()))?;
        if !output.status.success() {
            return Err(self.unavailable(format!("--version exited with {}", output.status)));
        }
        let banner = String::from_utf8_lossy(&output.stdout);
        debug!("{}", banner.lines().next().unwrap_or("tesseract"));
        Ok(())
    }

    fn recognize(&self, image: &Path, page: usize) -> Result<Vec<Word>, ExtractionError> {
        let output = Command::new(&self.executable)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", &self.psm.to_string()])
            .args(["--dpi", &self.dpi.to_string()])
            .arg("tsv")
            .output()
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Recognition {
                page: page + 1,
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout)).map_err(|reason| {
            ExtractionError::Recognition {
                page: page + 1,
                reason,
            }
        })
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Parses Tesseract TSV into words, in reading order.
///
/// Only word-level rows with non-blank text are kept. Each distinct
/// (block, paragraph, line) triple gets the next line ordinal.
pub fn parse_tsv(tsv: &str) -> Result<Vec<Word>, String> {
    let mut lines = tsv.lines();
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| "empty TSV output".to_string())?
        .split('\t')
        .collect();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| format!("TSV header lacks '{}'", name))
    };
    let level = column("level")?;
    let block = column("block_num")?;
    let par = column("par_num")?;
    let line_num = column("line_num")?;
    let left = column("left")?;
    let top = column("top")?;
    let width = column("width")?;
    let height = column("height")?;
    let conf = column("conf")?;
    let text = column("text")?;

    let mut words = Vec::new();
    let mut current: Option<(u32, u32, u32)> = None;
    let mut ordinal = 0u32;

    for row in lines {
        let fields: Vec<&str> = row.split('\t').collect();
        let Some(word_text) = fields.get(text).map(|t| t.trim()) else {
            continue;
        };
        if word_text.is_empty() || number::<u32>(&fields, level) != Some(WORD_LEVEL) {
            continue;
        }

        let key = (
            number(&fields, block).unwrap_or(0),
            number(&fields, par).unwrap_or(0),
            number(&fields, line_num).unwrap_or(0),
        );
        match current {
            Some(previous) if previous == key => {}
            Some(_) => ordinal += 1,
            None => {}
        }
        current = Some(key);

        let bbox = PixelBox::new(
            number(&fields, left).unwrap_or(0),
            number(&fields, top).unwrap_or(0),
            number(&fields, width).unwrap_or(0),
            number(&fields, height).unwrap_or(0),
        );
        let confidence = number::<f32>(&fields, conf).unwrap_or(0.0);
        words.push(Word::new(word_text, bbox, confidence).on_line(ordinal));
    }

    Ok(words)
}

fn number<T: std::str::FromStr>(fields: &[&str], index: usize) -> Option<T> {
    fields.get(index)?.trim().parse().ok()
}
