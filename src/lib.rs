//! OCR-driven PII detection and secure redaction for PDF documents.
//!
//! The crate is a three-stage pipeline joined by JSON artifacts:
//!
//! 1. **Extraction**: every page is rasterized with MuPDF and run through
//!    Tesseract, producing a [`Transcript`] of words with pixel boxes.
//!    Scanned pages and text-native pages are treated alike.
//! 2. **Classification**: deterministic rules (email, IP, credential, id
//!    number, phone) and an optional contextual tagger label each word; the
//!    result is a [`TaggedTranscript`].
//! 3. **Redaction**: flagged words are mapped from pixel space into page
//!    space, merged into boxes and burned into a copy of the document with
//!    MuPDF's redaction API, so the covered text is removed, not hidden.
//!
//! # Architecture
//!
//! - [`domain`]: artifacts, categories, geometry and the pattern matchers
//! - [`extraction`]: rasterization and OCR
//! - [`classification`]: rule pass, inference pass and arbitration
//! - [`redaction`]: planning, strategies and the redaction service
//! - [`pipeline`]: the three stages end to end, with resume
//! - [`config`], [`error`], [`report`]
//!
//! # Quick Start
//!
//! ```no_run
//! use pii_redactor::{ArtifactPaths, Pipeline, PipelineConfig, PipelineOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(PipelineConfig::builder().build()?);
//! let input = Path::new("statement.pdf");
//! let outcome = pipeline.run(input, ArtifactPaths::beside(input), &PipelineOptions::default())?;
//! println!("redacted copy at {}", outcome.paths.redacted.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Classifying a transcript
//!
//! ```
//! use pii_redactor::classification::Classifier;
//! use pii_redactor::config::ClassificationConfig;
//! use pii_redactor::domain::{Category, PageTranscript, PixelBox, Transcript, Word};
//!
//! let transcript = Transcript {
//!     pages: vec![PageTranscript {
//!         index: 0,
//!         width: 1000,
//!         height: 1300,
//!         dpi: 100,
//!         words: vec![
//!             Word::new("mail", PixelBox::new(10, 10, 40, 20), 95.0),
//!             Word::new("jane@example.com", PixelBox::new(60, 10, 120, 20), 95.0),
//!         ],
//!     }],
//! };
//! let tagged = Classifier::new(ClassificationConfig::default())
//!     .classify(&transcript)
//!     .unwrap();
//! assert_eq!(tagged.pages[0].words[1].category, Category::Email);
//! ```

pub mod artifact;
pub mod classification;
pub mod config;
pub mod domain;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod redaction;
pub mod report;

pub use classification::Classifier;
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use domain::{Category, PatternMatcher, Source, TaggedTranscript, Transcript};
pub use error::{
    ClassificationDegraded, ExtractionError, RedactionError, RedactorError, RedactorResult,
};
pub use extraction::Extractor;
pub use pipeline::{ArtifactPaths, Pipeline, PipelineOptions, PipelineOutcome};
pub use redaction::{
    RedactionOutcome, RedactionPlan, RedactionResult, RedactionService, RedactionStrategy,
    SecureRedactionStrategy,
};
pub use report::RedactionReport;
