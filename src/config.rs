//! Configuration for the extraction, classification and redaction stages.
//!
//! Every tunable lives in [`PipelineConfig`], built through
//! [`PipelineConfigBuilder`] so that callers only set what they care about
//! and ranges are checked once in [`PipelineConfigBuilder::build`].
//!
//! ```
//! use pii_redactor::PipelineConfig;
//!
//! let config = PipelineConfig::builder()
//!     .dpi(200)
//!     .max_words_per_chunk(300)
//!     .merge_gap(4.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.extraction.dpi, 200);
//! ```

use crate::error::{RedactorError, RedactorResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Optical extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Rasterization resolution. Default: 300.
    pub dpi: u32,
    /// Tesseract language code. Default: `eng`.
    pub language: String,
    /// Tesseract page segmentation mode. Default: 6 (single uniform block).
    pub page_segmentation_mode: u8,
    /// Path or name of the `tesseract` executable.
    pub tesseract_path: PathBuf,
    /// Documents with more pages are rejected. Default: 200.
    pub max_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            tesseract_path: PathBuf::from("tesseract"),
            max_pages: 200,
        }
    }
}

/// Connection settings for the remote tagger.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(skip_serializing, default)]
    pub api_key: String,
    /// Model identifier. Default: `gemini-2.0-flash`.
    pub model: String,
    /// API base URL, without the `/models/...` suffix.
    pub endpoint: String,
    /// Per-batch request timeout. Default: 45 000 ms.
    pub timeout_ms: u64,
}

impl InferenceConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 45_000,
        }
    }
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Words per inference request. Default: 600.
    pub max_words_per_chunk: usize,
    /// Neighbouring words sent on each side of an item. Default: 3.
    pub context_window: usize,
    /// Pause between consecutive inference requests. Default: 150 ms.
    pub request_interval_ms: u64,
    /// Remote tagger; `None` runs the rule pass only.
    pub inference: Option<InferenceConfig>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            max_words_per_chunk: 600,
            context_window: 3,
            request_interval_ms: 150,
            inference: None,
        }
    }
}

/// Geometric redaction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Largest horizontal gap, in page units, bridged when merging
    /// same-category neighbours. Default: 6.0.
    pub merge_gap: f32,
    /// Padding added around every word box, in raster pixels. Default: 0.
    pub padding_px: f32,
    /// Draw the category label inside each box. Default: false.
    pub label: bool,
    /// Label font size in points. Default: 8.
    pub label_size: f32,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            merge_gap: 6.0,
            padding_px: 0.0,
            label: false,
            label_size: 8.0,
        }
    }
}

/// Settings for a whole pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub classification: ClassificationConfig,
    pub redaction: RedactionConfig,
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.extraction.dpi = dpi;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.extraction.language = language.into();
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u8) -> Self {
        self.config.extraction.page_segmentation_mode = psm;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.extraction.tesseract_path = path.into();
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.extraction.max_pages = max_pages;
        self
    }

    pub fn max_words_per_chunk(mut self, size: usize) -> Self {
        self.config.classification.max_words_per_chunk = size;
        self
    }

    pub fn context_window(mut self, window: usize) -> Self {
        self.config.classification.context_window = window;
        self
    }

    pub fn request_interval_ms(mut self, ms: u64) -> Self {
        self.config.classification.request_interval_ms = ms;
        self
    }

    pub fn inference(mut self, inference: Option<InferenceConfig>) -> Self {
        self.config.classification.inference = inference;
        self
    }

    pub fn merge_gap(mut self, gap: f32) -> Self {
        self.config.redaction.merge_gap = gap;
        self
    }

    pub fn padding_px(mut self, padding: f32) -> Self {
        self.config.redaction.padding_px = padding;
        self
    }

    pub fn label(mut self, label: bool) -> Self {
        self.config.redaction.label = label;
        self
    }

    pub fn label_size(mut self, size: f32) -> Self {
        self.config.redaction.label_size = size;
        self
    }

    /// Validates ranges and returns the finished config.
    pub fn build(self) -> RedactorResult<PipelineConfig> {
        let c = &self.config;
        if !(72..=1200).contains(&c.extraction.dpi) {
            return Err(invalid("dpi", format!("{} is outside 72..=1200", c.extraction.dpi)));
        }
        if c.extraction.page_segmentation_mode > 13 {
            return Err(invalid(
                "page_segmentation_mode",
                format!("{} is outside 0..=13", c.extraction.page_segmentation_mode),
            ));
        }
        if c.extraction.max_pages == 0 {
            return Err(invalid("max_pages", "must be at least 1"));
        }
        if c.classification.max_words_per_chunk == 0 {
            return Err(invalid("max_words_per_chunk", "must be at least 1"));
        }
        if let Some(inference) = &c.classification.inference {
            if inference.api_key.trim().is_empty() {
                return Err(invalid("api_key", "inference is enabled but no API key is set"));
            }
            if inference.timeout_ms == 0 {
                return Err(invalid("timeout_ms", "must be positive"));
            }
        }
        if !(c.redaction.merge_gap.is_finite() && c.redaction.merge_gap >= 0.0) {
            return Err(invalid("merge_gap", "must be a non-negative number"));
        }
        if !(c.redaction.padding_px.is_finite() && c.redaction.padding_px >= 0.0) {
            return Err(invalid("padding_px", "must be a non-negative number"));
        }
        if !(2.0..=72.0).contains(&c.redaction.label_size) {
            return Err(invalid("label_size", "must be between 2 and 72 points"));
        }
        Ok(self.config)
    }
}

fn invalid(parameter: &str, reason: impl Into<String>) -> RedactorError {
    RedactorError::InvalidInput {
        parameter: parameter.to_string(),
        reason: reason.into(),
    }
}
