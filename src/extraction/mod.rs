//! Extraction stage: PDF in, [`Transcript`] out.
//!
//! Every page is rasterized with MuPDF (text-native pages included) and the
//! raster is handed to an [`OcrEngine`]. Extraction is all-or-nothing: the
//! first failing page aborts the document and no transcript is produced.

pub mod raster;
pub mod tesseract;

pub use raster::{Rasterizer, RenderedPage};
pub use tesseract::{parse_tsv, TesseractEngine};

use crate::config::ExtractionConfig;
use crate::domain::{PageTranscript, Transcript, Word};
use crate::error::{ExtractionError, RedactorError, RedactorResult};
use std::path::Path;
use tracing::{debug, info};

/// Optical recognition over a single rendered page.
pub trait OcrEngine: Send + Sync {
    /// Fails with [`ExtractionError::OcrUnavailable`] when the engine cannot
    /// be used at all.
    fn ensure_available(&self) -> Result<(), ExtractionError>;

    /// Recognizes the words of one page image. `page` is 0-based.
    fn recognize(&self, image: &Path, page: usize) -> Result<Vec<Word>, ExtractionError>;

    fn name(&self) -> &str;
}

/// Turns a document into a word-level transcript.
pub struct Extractor {
    engine: Box<dyn OcrEngine>,
    config: ExtractionConfig,
}

impl Extractor {
    /// Creates an extractor backed by the `tesseract` CLI.
    pub fn new(config: ExtractionConfig) -> Self {
        let engine = Box::new(TesseractEngine::new(&config));
        Self { engine, config }
    }

    pub fn with_engine(config: ExtractionConfig, engine: Box<dyn OcrEngine>) -> Self {
        Self { engine, config }
    }

    pub fn extract(&self, input: &Path) -> RedactorResult<Transcript> {
        if !input.is_file() {
            return Err(RedactorError::io(
                input,
                std::io::Error::new(std::io::ErrorKind::NotFound, "Input file does not exist"),
            ));
        }

        let rasterizer = Rasterizer::open(input, self.config.dpi)?;
        let total = rasterizer.page_count()?;
        if total > self.config.max_pages {
            return Err(ExtractionError::TooManyPages {
                pages: total,
                limit: self.config.max_pages,
            }
            .into());
        }
        self.engine.ensure_available()?;

        let scratch = tempfile::Builder::new()
            .prefix("pii-redactor-")
            .tempdir()
            .map_err(|e| RedactorError::io(std::env::temp_dir(), e))?;
        debug!(
            "rasterizing {} pages at {} dpi into {} for {}",
            total,
            self.config.dpi,
            scratch.path().display(),
            self.engine_name()
        );

        let mut pages = Vec::with_capacity(total);
        for index in 0..total {
            let rendered = rasterizer.render(index, scratch.path())?;
            let words = self.engine.recognize(&rendered.path, index)?;
            info!("page {}/{}: {} words", index + 1, total, words.len());

            // The raster is only needed until the engine has read it.
            let _ = std::fs::remove_file(&rendered.path);

            pages.push(PageTranscript {
                index,
                width: rendered.width,
                height: rendered.height,
                dpi: self.config.dpi,
                words,
            });
        }

        Ok(Transcript { pages })
    }

    /// Extracts `input` and writes the plain-text rendering to `path`.
    pub fn extract_with_text_dump(&self, input: &Path, path: &Path) -> RedactorResult<Transcript> {
        let transcript = self.extract(input)?;
        std::fs::write(path, transcript.plain_text()).map_err(|e| RedactorError::io(path, e))?;
        Ok(transcript)
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }
}
