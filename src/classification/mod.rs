//! Classification stage: transcript in, tagged transcript out.
//!
//! Two passes run over every page. The [`RuleEngine`] applies deterministic
//! patterns; an optional [`InferenceClient`] tags context-dependent PII in
//! batches. Their opinions are merged per word by [`arbitrate`]. A failing
//! inference batch never aborts the run: its words fall back to the rule
//! result and the run is marked degraded.

pub mod arbitration;
pub mod gemini;
pub mod inference;
pub mod rules;

pub use arbitration::{arbitrate, Candidate};
pub use gemini::GeminiClient;
pub use inference::{InferenceClient, InferenceItem, InferenceLabel};
pub use rules::RuleEngine;

use crate::config::ClassificationConfig;
use crate::domain::{
    Category, ClassificationStatus, PageTranscript, Source, TaggedPage, TaggedTranscript,
    TaggedWord, Transcript,
};
use crate::error::{ClassificationDegraded, InferenceError, RedactorResult};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs both detection passes and arbitrates between them.
pub struct Classifier {
    rules: RuleEngine,
    client: Option<Box<dyn InferenceClient>>,
    config: ClassificationConfig,
}

/// Bookkeeping for inference batches across one run.
#[derive(Default)]
struct BatchTally {
    total: usize,
    failed: usize,
    first_error: Option<InferenceError>,
}

impl Classifier {
    /// Creates a rule-only classifier.
    pub fn new(config: ClassificationConfig) -> Self {
        Self {
            rules: RuleEngine::new(),
            client: None,
            config,
        }
    }

    /// Creates a classifier with the Gemini tagger when the config has one.
    /// A client that cannot be constructed leaves the run rule-only (and
    /// therefore degraded) rather than failing it.
    pub fn from_config(config: ClassificationConfig) -> Self {
        let client = match &config.inference {
            Some(inference) => match GeminiClient::new(inference) {
                Ok(client) => Some(Box::new(client) as Box<dyn InferenceClient>),
                Err(e) => {
                    warn!("contextual inference disabled: {}", e);
                    None
                }
            },
            None => None,
        };
        let mut classifier = Self::new(config);
        classifier.client = client;
        classifier
    }

    pub fn with_client(mut self, client: Box<dyn InferenceClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Tags every word of `transcript`.
    ///
    /// Fails only when the transcript itself is structurally invalid.
    pub fn classify(&self, transcript: &Transcript) -> RedactorResult<TaggedTranscript> {
        transcript.validate()?;

        let mut tally = BatchTally::default();
        let mut pages = Vec::with_capacity(transcript.pages.len());

        for page in &transcript.pages {
            let tagged = self.classify_page(page, &mut tally);
            info!(
                "page {}: tagged {} PII tokens",
                page.index + 1,
                tagged.flagged().count()
            );
            pages.push(tagged);
        }

        let degraded = self.degradation(&tally);
        if let Some(notice) = &degraded {
            warn!("{}", notice);
        }

        Ok(TaggedTranscript {
            pages,
            classification: ClassificationStatus {
                inference: self.client.as_ref().map(|c| c.name().to_string()),
                total_batches: tally.total,
                failed_batches: tally.failed,
                degraded,
            },
        })
    }

    fn classify_page(&self, page: &PageTranscript, tally: &mut BatchTally) -> TaggedPage {
        let rule_categories = self.rules.classify_page(&page.words);
        let inferred = self.infer_page(page, tally);

        let words = page
            .words
            .iter()
            .zip(rule_categories)
            .zip(inferred)
            .map(|((word, rule), inferred)| {
                let candidates = [
                    Candidate::new(Source::Rule, rule.unwrap_or_default()),
                    Candidate::new(Source::Inference, inferred),
                ];
                match arbitrate(&candidates) {
                    (category, Some(source)) => TaggedWord::tagged(word.clone(), category, source),
                    (_, None) => TaggedWord::untagged(word.clone()),
                }
            })
            .collect();

        TaggedPage {
            index: page.index,
            width: page.width,
            height: page.height,
            dpi: page.dpi,
            words,
        }
    }

    /// Inference categories for a page; `none` wherever a batch failed.
    fn infer_page(&self, page: &PageTranscript, tally: &mut BatchTally) -> Vec<Category> {
        let mut categories = vec![Category::None; page.words.len()];
        let Some(client) = &self.client else {
            return categories;
        };

        let chunk = self.config.max_words_per_chunk.max(1);
        let mut start = 0;
        while start < page.words.len() {
            let end = (start + chunk).min(page.words.len());
            if tally.total > 0 && self.config.request_interval_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.config.request_interval_ms));
            }
            tally.total += 1;

            let batch = inference::build_batch(&page.words, start..end, self.config.context_window);
            match client.classify(&batch) {
                Ok(labels) => {
                    for label in labels.into_iter().filter(|l| l.index < batch.len()) {
                        categories[start + label.index] = label.category;
                    }
                }
                Err(e) => {
                    debug!(
                        "page {}: inference batch {}..{} failed: {}",
                        page.index + 1,
                        start,
                        end,
                        e
                    );
                    tally.failed += 1;
                    tally.first_error.get_or_insert(e);
                }
            }
            start = end;
        }

        categories
    }

    fn degradation(&self, tally: &BatchTally) -> Option<ClassificationDegraded> {
        if self.client.is_none() {
            return Some(ClassificationDegraded {
                reason: "contextual inference is not configured".to_string(),
                failed_batches: 0,
                total_batches: 0,
            });
        }
        tally.first_error.as_ref().map(|e| ClassificationDegraded {
            reason: e.to_string(),
            failed_batches: tally.failed,
            total_batches: tally.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PixelBox, Word};

    struct FixedClient(Vec<InferenceLabel>);

    impl InferenceClient for FixedClient {
        fn classify(&self, _: &[InferenceItem]) -> Result<Vec<InferenceLabel>, InferenceError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn transcript(texts: &[&str]) -> Transcript {
        Transcript {
            pages: vec![PageTranscript {
                index: 0,
                width: 100,
                height: 100,
                dpi: 72,
                words: texts
                    .iter()
                    .map(|t| Word::new(*t, PixelBox::new(0, 0, 5, 5), 95.0))
                    .collect(),
            }],
        }
    }

    fn config() -> ClassificationConfig {
        ClassificationConfig {
            request_interval_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_rule_only_run_is_degraded() {
        let tagged = Classifier::new(config())
            .classify(&transcript(&["mail", "jane@example.com"]))
            .unwrap();
        assert_eq!(tagged.pages[0].words[1].category, Category::Email);
        assert!(tagged.degraded().is_some());
        assert_eq!(tagged.classification.inference, None);
    }

    #[test]
    fn test_rule_wins_over_inference() {
        let client = FixedClient(vec![
            InferenceLabel {
                index: 0,
                category: Category::Name,
            },
            InferenceLabel {
                index: 1,
                category: Category::Name,
            },
        ]);
        let tagged = Classifier::new(config())
            .with_client(Box::new(client))
            .classify(&transcript(&["Jane", "jane@example.com"]))
            .unwrap();
        let words = &tagged.pages[0].words;
        assert_eq!(words[0].category, Category::Name);
        assert_eq!(words[0].source, Some(Source::Inference));
        assert_eq!(words[1].category, Category::Email);
        assert_eq!(words[1].source, Some(Source::Rule));
        assert!(tagged.degraded().is_none());
    }
}
