//! PII redaction CLI.
//!
//! Runs the extract → classify → redact pipeline as a whole or stage by
//! stage, with the intermediate JSON artifacts on disk between stages.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pii_redactor::config::InferenceConfig;
use pii_redactor::{
    ArtifactPaths, Category, Classifier, Extractor, Pipeline, PipelineConfig,
    PipelineConfigBuilder, PipelineOptions, RedactionOutcome, RedactionService, TaggedTranscript,
    Transcript,
};

/// PII Redaction Tool
///
/// Finds personal information in PDF documents by OCR and burns opaque
/// boxes over it, removing the underlying text.
#[derive(Parser)]
#[command(name = "pii-redactor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rasterize and OCR a PDF into a word transcript
    Extract {
        /// Input PDF file path
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Transcript path (defaults to <input>.transcript.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also write a plain-text page dump
        #[arg(long, value_name = "FILE")]
        text: Option<PathBuf>,

        #[command(flatten)]
        ocr: OcrArgs,
    },

    /// Tag the words of a transcript with PII categories
    Classify {
        /// Transcript produced by `extract`
        #[arg(value_name = "TRANSCRIPT")]
        transcript: PathBuf,

        /// Tagged transcript path (defaults to <base>.tagged.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// Burn the tagged words of a transcript into a redacted copy
    Redact {
        /// Original PDF
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Tagged transcript produced by `classify`
        #[arg(value_name = "TAGGED")]
        tagged: PathBuf,

        /// Redacted PDF path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Report path (defaults to <output>.report.json)
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        redaction: RedactionArgs,
    },

    /// Run every stage, reusing artifacts that already exist
    Run {
        /// Input PDF file path
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Base path for all artifacts (defaults to the input without extension)
        #[arg(long, value_name = "BASE")]
        out_base: Option<PathBuf>,

        /// Re-run OCR even if a transcript exists
        #[arg(long)]
        force_extract: bool,

        /// Do not classify; reuse an existing tagged transcript if present
        #[arg(long)]
        skip_classify: bool,

        /// Stop before redaction
        #[arg(long)]
        skip_redact: bool,

        /// Also write a plain-text page dump
        #[arg(long)]
        text: bool,

        #[command(flatten)]
        ocr: OcrArgs,

        #[command(flatten)]
        inference: InferenceArgs,

        #[command(flatten)]
        redaction: RedactionArgs,
    },

    /// Extract the text layer of a PDF (for debugging and verification)
    ExtractText {
        /// Input PDF file path
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check that no tagged word is still extractable from a redacted PDF
    Verify {
        /// Redacted PDF
        #[arg(value_name = "PDF")]
        redacted: PathBuf,

        /// Tagged transcript the PDF was redacted from
        #[arg(value_name = "TAGGED")]
        tagged: PathBuf,
    },
}

#[derive(Args, Clone)]
struct OcrArgs {
    /// Rasterization resolution
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Tesseract language
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Tesseract page segmentation mode
    #[arg(long, default_value_t = 6)]
    psm: u8,

    /// Path to the tesseract executable
    #[arg(long, value_name = "PATH", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Reject documents with more pages
    #[arg(long, default_value_t = 200)]
    max_pages: usize,
}

impl OcrArgs {
    fn apply(&self, builder: PipelineConfigBuilder) -> PipelineConfigBuilder {
        builder
            .dpi(self.dpi)
            .language(&self.lang)
            .page_segmentation_mode(self.psm)
            .tesseract_path(&self.tesseract)
            .max_pages(self.max_pages)
    }
}

#[derive(Args, Clone)]
struct InferenceArgs {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = InferenceConfig::DEFAULT_MODEL)]
    model: String,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 45_000)]
    timeout_ms: u64,

    /// Words per inference request
    #[arg(long, env = "MAX_WORDS_PER_CHUNK", default_value_t = 600)]
    chunk_size: usize,

    /// Neighbouring words sent as context on each side
    #[arg(long, default_value_t = 3)]
    context_window: usize,

    /// Pause between inference requests in milliseconds
    #[arg(long, default_value_t = 150)]
    request_interval_ms: u64,

    /// Run the rule pass only
    #[arg(long)]
    no_inference: bool,
}

impl InferenceArgs {
    fn apply(&self, builder: PipelineConfigBuilder) -> PipelineConfigBuilder {
        let key = self.api_key.as_deref().map(str::trim).unwrap_or("");
        let inference = if self.no_inference {
            None
        } else if key.is_empty() {
            warn!("GEMINI_API_KEY is not set; names and addresses will not be detected");
            None
        } else {
            let mut config = InferenceConfig::new(key);
            config.model = self.model.clone();
            config.timeout_ms = self.timeout_ms;
            Some(config)
        };

        builder
            .inference(inference)
            .max_words_per_chunk(self.chunk_size)
            .context_window(self.context_window)
            .request_interval_ms(self.request_interval_ms)
    }
}

#[derive(Args, Clone)]
struct RedactionArgs {
    /// Categories to redact, comma separated, or `all`
    #[arg(long, default_value = "all")]
    types: String,

    /// Draw the category label inside each box
    #[arg(long)]
    label: bool,

    /// Label font size in points
    #[arg(long, default_value_t = 8.0)]
    label_size: f32,

    /// Padding around each word box, in raster pixels
    #[arg(long, default_value_t = 0.0)]
    margin: f32,

    /// Largest gap between same-category words merged into one box, in points
    #[arg(long, default_value_t = 6.0)]
    merge_gap: f32,
}

impl RedactionArgs {
    fn apply(&self, builder: PipelineConfigBuilder) -> PipelineConfigBuilder {
        builder
            .label(self.label)
            .label_size(self.label_size)
            .padding_px(self.margin)
            .merge_gap(self.merge_gap)
    }

    /// Selected categories; `None` when every category is selected.
    fn categories(&self) -> Option<Vec<Category>> {
        let (chosen, unknown) = Category::parse_selection(&self.types);
        for name in &unknown {
            warn!("ignoring unknown category '{}'", name);
        }
        (chosen.len() < Category::PII.len()).then_some(chosen)
    }
}

/// Command handler shared by all subcommands.
struct CommandHandler {
    verbose: bool,
}

impl CommandHandler {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn extract(
        &self,
        input: &Path,
        output: Option<&Path>,
        text: Option<&Path>,
        ocr: &OcrArgs,
    ) -> Result<()> {
        ensure_exists(input)?;
        let config = ocr.apply(PipelineConfig::builder()).build()?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ArtifactPaths::beside(input).transcript);

        let extractor = Extractor::new(config.extraction);
        let transcript = match text {
            Some(text) => extractor.extract_with_text_dump(input, text),
            None => extractor.extract(input),
        }
        .with_context(|| format!("Extraction failed for {}", input.display()))?;
        transcript.save(&output)?;

        if let Some(text) = text {
            println!("✓ Page text → {}", text.display());
        }
        println!(
            "✓ {} words on {} page(s) → {}",
            transcript.word_count(),
            transcript.pages.len(),
            output.display()
        );
        Ok(())
    }

    fn classify(
        &self,
        transcript_path: &Path,
        output: Option<&Path>,
        inference: &InferenceArgs,
    ) -> Result<()> {
        ensure_exists(transcript_path)?;
        let config = inference.apply(PipelineConfig::builder()).build()?;
        let transcript = Transcript::load(transcript_path)
            .with_context(|| format!("Cannot load transcript {}", transcript_path.display()))?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| tagged_path_for(transcript_path));

        let tagged = Classifier::from_config(config.classification)
            .classify(&transcript)
            .with_context(|| "Classification failed")?;
        tagged.save(&output)?;

        if self.verbose {
            println!("\nClassification Summary:");
            for (category, count) in count_by_category(&tagged) {
                println!("  {:<12} {}", category, count);
            }
        }
        if let Some(notice) = tagged.degraded() {
            println!("⚠ {}", notice);
        }
        println!(
            "✓ Tagged {} PII word(s) → {}",
            tagged.flagged_count(),
            output.display()
        );
        Ok(())
    }

    fn redact(
        &self,
        input: &Path,
        tagged_path: &Path,
        output: &Path,
        report: Option<&Path>,
        args: &RedactionArgs,
    ) -> Result<()> {
        ensure_exists(input)?;
        ensure_exists(tagged_path)?;
        let config = args.apply(PipelineConfig::builder()).build()?;
        let mut tagged = TaggedTranscript::load(tagged_path)
            .with_context(|| format!("Cannot load tagged transcript {}", tagged_path.display()))?;
        if let Some(categories) = args.categories() {
            tagged.retain_categories(&categories);
        }

        let service = RedactionService::with_secure_strategy(config.redaction);
        if self.verbose {
            println!("Input:    {}", input.display());
            println!("Output:   {}", output.display());
            println!("Strategy: {}", service.strategy_name());
        }

        let outcome = service
            .redact(input, output, &tagged)
            .with_context(|| "Redaction failed")?;

        let report = report
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output.with_extension("report.json"));
        outcome.report.save(&report)?;

        self.print_redaction(&outcome, output);
        println!("✓ Report → {}", report.display());
        Ok(())
    }

    fn run(
        &self,
        input: &Path,
        out_base: Option<&Path>,
        options: PipelineOptions,
        builder: PipelineConfigBuilder,
    ) -> Result<()> {
        ensure_exists(input)?;
        let paths = match out_base {
            Some(base) => ArtifactPaths::from_base(base),
            None => ArtifactPaths::beside(input),
        };
        let pipeline = Pipeline::new(builder.build()?);
        let outcome = pipeline.run(input, paths, &options).map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e)
                .context(format!("{} stage failed for {}", stage, input.display()))
        })?;

        if outcome.transcript_reused {
            println!("ℹ Reused {}", outcome.paths.transcript.display());
        } else {
            println!("✓ Transcript → {}", outcome.paths.transcript.display());
        }
        if let Some(tagged) = &outcome.tagged {
            if let Some(notice) = tagged.degraded() {
                println!("⚠ {}", notice);
            }
            println!("✓ Tagged transcript → {}", outcome.paths.tagged.display());
        }
        match &outcome.redaction {
            Some(redaction) => {
                self.print_redaction(redaction, &outcome.paths.redacted);
                println!("✓ Report → {}", outcome.paths.report.display());
            }
            None => println!("ℹ Skipped redaction"),
        }
        Ok(())
    }

    /// Extracts text from a PDF.
    fn extract_text(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        ensure_exists(input)?;
        let service = RedactionService::with_secure_strategy(Default::default());
        let text = service
            .extract_text(input)
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }
        Ok(())
    }

    fn verify(&self, redacted: &Path, tagged_path: &Path) -> Result<()> {
        ensure_exists(redacted)?;
        ensure_exists(tagged_path)?;
        let tagged = TaggedTranscript::load(tagged_path)
            .with_context(|| format!("Cannot load tagged transcript {}", tagged_path.display()))?;

        let service = RedactionService::with_secure_strategy(Default::default());
        let leaked = service
            .verify(redacted, &tagged)
            .with_context(|| "Verification failed")?;

        if leaked.is_empty() {
            println!("✓ No redacted text is extractable from {}", redacted.display());
            return Ok(());
        }
        for text in &leaked {
            println!("  leaked: {}", text);
        }
        anyhow::bail!("{} redacted word(s) are still extractable", leaked.len())
    }

    fn print_redaction(&self, outcome: &RedactionOutcome, output: &Path) {
        let result = &outcome.result;
        if self.verbose {
            println!("\nRedaction Summary:");
            println!("  Pages processed: {}", result.pages_processed);
            println!("  Pages modified:  {}", result.pages_modified);
            println!("  Boxes applied:   {}", result.boxes_applied);
            println!("  Labels drawn:    {}", result.labels_drawn);
            for (category, count) in &outcome.report.summary.by_category {
                println!("  {:<16} {}", category, count);
            }
        }
        if let Some(notice) = &outcome.report.summary.degraded {
            println!("⚠ {}", notice);
        }
        if result.has_redactions() {
            println!(
                "✓ Successfully redacted {} box(es) → {}",
                result.boxes_applied,
                output.display()
            );
        } else {
            println!("⚠ No PII found to redact; copied → {}", output.display());
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    Ok(())
}

/// `doc.transcript.json` → `doc.tagged.json`; anything else gets
/// `.tagged.json` appended to its stem.
fn tagged_path_for(transcript: &Path) -> PathBuf {
    let name = transcript
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".transcript.json")
        .or_else(|| name.strip_suffix(".json"))
        .unwrap_or(&name);
    transcript.with_file_name(format!("{}.tagged.json", stem))
}

fn count_by_category(tagged: &TaggedTranscript) -> std::collections::BTreeMap<Category, usize> {
    let mut counts = std::collections::BTreeMap::new();
    for (_, word) in tagged.pages.iter().flat_map(|p| p.flagged()) {
        *counts.entry(word.category).or_default() += 1;
    }
    counts
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let handler = CommandHandler::new(cli.verbose);

    match &cli.command {
        Commands::Extract {
            input,
            output,
            text,
            ocr,
        } => handler.extract(input, output.as_deref(), text.as_deref(), ocr)?,
        Commands::Classify {
            transcript,
            output,
            inference,
        } => handler.classify(transcript, output.as_deref(), inference)?,
        Commands::Redact {
            input,
            tagged,
            output,
            report,
            redaction,
        } => handler.redact(input, tagged, output, report.as_deref(), redaction)?,
        Commands::Run {
            input,
            out_base,
            force_extract,
            skip_classify,
            skip_redact,
            text,
            ocr,
            inference,
            redaction,
        } => {
            let options = PipelineOptions {
                force_extract: *force_extract,
                skip_classify: *skip_classify,
                skip_redact: *skip_redact,
                text_dump: *text,
                categories: redaction.categories(),
            };
            let builder = redaction.apply(inference.apply(ocr.apply(PipelineConfig::builder())));
            handler.run(input, out_base.as_deref(), options, builder)?;
        }
        Commands::ExtractText { input, output } => handler.extract_text(input, output.as_deref())?,
        Commands::Verify { redacted, tagged } => handler.verify(redacted, tagged)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_path_for() {
        assert_eq!(
            tagged_path_for(Path::new("out/doc.transcript.json")),
            PathBuf::from("out/doc.tagged.json")
        );
        assert_eq!(
            tagged_path_for(Path::new("scan.json")),
            PathBuf::from("scan.tagged.json")
        );
    }

    #[test]
    fn test_category_selection() {
        let args = RedactionArgs {
            types: "email, phone, bogus".to_string(),
            label: false,
            label_size: 8.0,
            margin: 0.0,
            merge_gap: 6.0,
        };
        assert_eq!(args.categories(), Some(vec![Category::Email, Category::Phone]));

        let all = RedactionArgs {
            types: "all".to_string(),
            ..args
        };
        assert_eq!(all.categories(), None);
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "pii-redactor",
            "run",
            "in.pdf",
            "--skip-redact",
            "--no-inference",
            "--types",
            "email",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Run { skip_redact: true, .. }));
    }
}
