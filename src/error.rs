//! Error types for the PII redaction pipeline.
//!
//! Each pipeline stage owns its failure type:
//!
//! * [`ExtractionError`] is fatal: the document cannot be rasterized or the
//!   OCR engine is missing. No transcript is produced.
//! * [`InferenceError`] is not: a single contextual-inference batch failed.
//!   The classifier absorbs it and records a [`ClassificationDegraded`]
//!   notice for the run.
//! * [`RedactionError`] is fatal: the source document and the tagged
//!   transcript disagree, or the output cannot be written. Raised before any
//!   output file exists.
//!
//! [`RedactorError`] wraps all of them together with artifact and I/O
//! failures so callers can `?` through a whole run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Classification,
    Redaction,
    /// Input validation, artifact loading and other glue between stages.
    Pipeline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extraction => "extraction",
            Self::Classification => "classification",
            Self::Redaction => "redaction",
            Self::Pipeline => "pipeline",
        };
        f.write_str(name)
    }
}

/// Failures of the optical extraction stage.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("cannot open '{}' for rasterization: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("document has {pages} pages, above the configured limit of {limit}")]
    TooManyPages { pages: usize, limit: usize },

    #[error("rasterization failed for page {page}: {reason}")]
    Rasterization { page: usize, reason: String },

    #[error("OCR engine '{engine}' is unavailable: {reason}")]
    OcrUnavailable { engine: String, reason: String },

    #[error("OCR failed on page {page}: {reason}")]
    Recognition { page: usize, reason: String },
}

/// Failure of one contextual-inference batch.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("inference request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("inference service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("inference transport error: {0}")]
    Transport(String),

    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
}

/// Notice attached to a classification run whose contextual pass did not
/// fully complete. Rule-based results are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("classification degraded: {reason} ({failed_batches}/{total_batches} inference batches failed)")]
pub struct ClassificationDegraded {
    pub reason: String,
    pub failed_batches: usize,
    pub total_batches: usize,
}

/// Failures of the geometric redaction stage.
#[derive(Debug, Error)]
pub enum RedactionError {
    #[error("cannot open '{}' for redaction: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("tagged transcript references page {page} but the document has {total} pages")]
    PageOutOfRange { page: usize, total: usize },

    #[error("failed to apply redactions on page {page}: {reason}")]
    Apply { page: usize, reason: String },

    #[error("cannot write redacted document '{}': {reason}", .path.display())]
    Unwritable { path: PathBuf, reason: String },
}

/// Top-level error for all pipeline operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    /// A transcript, tagged transcript or report could not be parsed or
    /// violates its structural invariants.
    #[error("corrupt artifact: {reason}")]
    Artifact { reason: String },

    #[error("Pattern error for '{pattern}': {reason}")]
    PatternError { pattern: String, reason: String },

    #[error("Text extraction failed for '{}': {reason}", .path.display())]
    TextExtraction { path: PathBuf, reason: String },

    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },
}

impl RedactorError {
    /// Stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Extraction(_) => Stage::Extraction,
            Self::Redaction(_) | Self::TextExtraction { .. } => Stage::Redaction,
            Self::PatternError { .. } => Stage::Classification,
            Self::Io { .. } | Self::Artifact { .. } | Self::InvalidInput { .. } => Stage::Pipeline,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn artifact(reason: impl Into<String>) -> Self {
        Self::Artifact {
            reason: reason.into(),
        }
    }
}

impl From<regex::Error> for RedactorError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RedactorError {
    fn from(err: serde_json::Error) -> Self {
        Self::artifact(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RedactorError::from(RedactionError::PageOutOfRange { page: 5, total: 3 });
        assert_eq!(
            err.to_string(),
            "tagged transcript references page 5 but the document has 3 pages"
        );
        assert_eq!(err.stage(), Stage::Redaction);
    }

    #[test]
    fn test_degraded_display() {
        let notice = ClassificationDegraded {
            reason: "inference request timed out after 10ms".to_string(),
            failed_batches: 1,
            total_batches: 4,
        };
        assert!(notice.to_string().contains("1/4"));
    }
}
