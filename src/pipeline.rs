//! End-to-end orchestration of extract → classify → redact.
//!
//! Each stage persists its artifact under a common base path, so a later
//! run can resume from whatever is already on disk.

use crate::classification::Classifier;
use crate::config::PipelineConfig;
use crate::domain::{Category, TaggedTranscript, Transcript};
use crate::error::{RedactorError, RedactorResult};
use crate::extraction::Extractor;
use crate::redaction::{RedactionOutcome, RedactionService};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact locations derived from one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub transcript: PathBuf,
    pub tagged: PathBuf,
    pub redacted: PathBuf,
    pub report: PathBuf,
    pub text: PathBuf,
}

impl ArtifactPaths {
    /// `base` is used as a prefix: `out/doc` yields `out/doc.transcript.json`
    /// and so on.
    pub fn from_base(base: &Path) -> Self {
        let with = |suffix: &str| {
            let mut s = OsString::from(base.as_os_str());
            s.push(suffix);
            PathBuf::from(s)
        };
        Self {
            transcript: with(".transcript.json"),
            tagged: with(".tagged.json"),
            redacted: with(".redacted.pdf"),
            report: with(".report.json"),
            text: with(".txt"),
        }
    }

    /// Base next to the input, with its extension removed.
    pub fn beside(input: &Path) -> Self {
        Self::from_base(&input.with_extension(""))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Re-run extraction even when a transcript already exists.
    pub force_extract: bool,
    /// Reuse an existing tagged transcript instead of classifying.
    pub skip_classify: bool,
    pub skip_redact: bool,
    /// Also write the plain-text page dump.
    pub text_dump: bool,
    /// Categories to redact; `None` redacts every category.
    pub categories: Option<Vec<Category>>,
}

/// What a pipeline run did.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub paths: ArtifactPaths,
    pub transcript_reused: bool,
    pub tagged: Option<TaggedTranscript>,
    pub redaction: Option<RedactionOutcome>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        input: &Path,
        paths: ArtifactPaths,
        options: &PipelineOptions,
    ) -> RedactorResult<PipelineOutcome> {
        if !input.is_file() {
            return Err(RedactorError::io(
                input,
                std::io::Error::new(std::io::ErrorKind::NotFound, "Input file does not exist"),
            ));
        }

        let (transcript, transcript_reused) = self.transcript(input, &paths, options)?;

        let tagged = if options.skip_classify {
            if paths.tagged.is_file() {
                info!("reusing {}", paths.tagged.display());
                Some(TaggedTranscript::load(&paths.tagged)?)
            } else {
                info!("skipping classification");
                None
            }
        } else {
            let tagged = Classifier::from_config(self.config.classification.clone())
                .classify(&transcript)?;
            tagged.save(&paths.tagged)?;
            info!(
                "{} PII words tagged -> {}",
                tagged.flagged_count(),
                paths.tagged.display()
            );
            Some(tagged)
        };

        let redaction = match (&tagged, options.skip_redact) {
            (_, true) => {
                info!("skipping redaction");
                None
            }
            (None, false) => {
                return Err(RedactorError::InvalidInput {
                    parameter: "skip_classify".to_string(),
                    reason: format!(
                        "redaction needs '{}', which does not exist",
                        paths.tagged.display()
                    ),
                })
            }
            (Some(tagged), false) => {
                let mut selected = tagged.clone();
                if let Some(categories) = &options.categories {
                    selected.retain_categories(categories);
                }
                let service = RedactionService::with_secure_strategy(self.config.redaction.clone());
                let outcome = service.redact(input, &paths.redacted, &selected)?;
                outcome.report.save(&paths.report)?;
                info!("redacted PDF -> {}", paths.redacted.display());
                Some(outcome)
            }
        };

        Ok(PipelineOutcome {
            paths,
            transcript_reused,
            tagged,
            redaction,
        })
    }

    fn transcript(
        &self,
        input: &Path,
        paths: &ArtifactPaths,
        options: &PipelineOptions,
    ) -> RedactorResult<(Transcript, bool)> {
        if paths.transcript.is_file() && !options.force_extract {
            info!("reusing {}", paths.transcript.display());
            return Ok((Transcript::load(&paths.transcript)?, true));
        }

        let extractor = Extractor::new(self.config.extraction.clone());
        let transcript = if options.text_dump {
            extractor.extract_with_text_dump(input, &paths.text)?
        } else {
            extractor.extract(input)?
        };
        transcript.save(&paths.transcript)?;
        info!(
            "{} words on {} pages -> {}",
            transcript.word_count(),
            transcript.pages.len(),
            paths.transcript.display()
        );
        Ok((transcript, false))
    }
}
