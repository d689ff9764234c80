//! Redaction stage: original document plus tagged transcript in, redacted
//! document and report out.
//!
//! The service validates the tagged transcript against the document, plans
//! every box with [`plan_redactions`] and only then hands the plan to a
//! [`RedactionStrategy`]. Nothing is written when validation fails.

pub mod overlay;
pub mod plan;
pub mod secure;
pub mod strategy;

pub use plan::{plan_redactions, PageRedactions, RedactionBox, RedactionPlan};
pub use secure::SecureRedactionStrategy;
pub use strategy::{LabelStyle, RedactionResult, RedactionStrategy};

use crate::config::RedactionConfig;
use crate::domain::TaggedTranscript;
use crate::error::{RedactorError, RedactorResult};
use crate::report::RedactionReport;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Everything a redaction run produced.
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    pub result: RedactionResult,
    pub report: RedactionReport,
    pub plan: RedactionPlan,
}

/// Redaction service coordinating planning and strategy execution.
pub struct RedactionService {
    strategy: Box<dyn RedactionStrategy>,
    config: RedactionConfig,
}

impl RedactionService {
    pub fn new(strategy: Box<dyn RedactionStrategy>, config: RedactionConfig) -> Self {
        Self { strategy, config }
    }

    /// Creates a service with secure (physical removal) redaction.
    pub fn with_secure_strategy(config: RedactionConfig) -> Self {
        Self::new(Box::new(SecureRedactionStrategy::new()), config)
    }

    /// Computes box placement without touching the output.
    pub fn plan(&self, input: &Path, tagged: &TaggedTranscript) -> RedactorResult<RedactionPlan> {
        if !input.is_file() {
            return Err(RedactorError::io(
                input,
                std::io::Error::new(std::io::ErrorKind::NotFound, "Input file does not exist"),
            ));
        }
        tagged.validate()?;
        let bounds = self.strategy.page_bounds(input)?;
        Ok(plan_redactions(tagged, &bounds, &self.config)?)
    }

    /// Writes the redacted copy of `input` to `output`.
    pub fn redact(
        &self,
        input: &Path,
        output: &Path,
        tagged: &TaggedTranscript,
    ) -> RedactorResult<RedactionOutcome> {
        let plan = self.plan(input, tagged)?;
        let labels = self.config.label.then_some(LabelStyle {
            font_size: self.config.label_size,
        });

        let result = self.strategy.apply(input, output, &plan, labels)?;
        info!(
            "{}: {} boxes on {} of {} pages",
            self.strategy.name(),
            result.boxes_applied,
            result.pages_modified,
            result.pages_processed
        );

        let report = RedactionReport::build(tagged, &plan);
        Ok(RedactionOutcome {
            result,
            report,
            plan,
        })
    }

    /// Extracts text from a PDF for analysis.
    pub fn extract_text(&self, input: &Path) -> RedactorResult<String> {
        self.strategy.extract_text(input)
    }

    /// Flagged words of `tagged` that are still extractable from `redacted`.
    ///
    /// Words shorter than three characters are skipped; they match too much
    /// unrelated text to be meaningful.
    pub fn verify(&self, redacted: &Path, tagged: &TaggedTranscript) -> RedactorResult<Vec<String>> {
        let text = self.extract_text(redacted)?;
        let haystack = normalize_whitespace(&text);

        let leaked: BTreeSet<String> = tagged
            .pages
            .iter()
            .flat_map(|p| p.flagged())
            .map(|(_, w)| w.word.text.trim().to_string())
            .filter(|t| t.chars().count() >= 3 && haystack.contains(t.as_str()))
            .collect();
        Ok(leaked.into_iter().collect())
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
