//! CLI tests against the built binary.
//!
//! Stages that need OCR are exercised from pre-written transcripts.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

mod common;
use common::*;

fn redactor_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pii-redactor");
    cmd.env_remove("GEMINI_API_KEY");
    cmd
}

mod argument_parsing {
    use super::*;

    #[test]
    fn test_help_lists_subcommands() {
        redactor_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("extract"))
            .stdout(predicate::str::contains("classify"))
            .stdout(predicate::str::contains("redact"))
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("verify"));
    }

    #[test]
    fn test_version() {
        redactor_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pii-redactor"));
    }

    #[test]
    fn test_redact_requires_three_paths() {
        redactor_cmd()
            .args(["redact", "in.pdf", "in.tagged.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("OUTPUT"));
    }

    #[test]
    fn test_run_help_shows_resume_flags() {
        redactor_cmd()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force-extract"))
            .stdout(predicate::str::contains("--skip-classify"))
            .stdout(predicate::str::contains("--no-inference"));
    }
}

mod classify {
    use super::*;

    #[test]
    fn test_rule_only_classification_writes_tagged_artifact() {
        let dir = TempDir::new().unwrap();
        let transcript = dir.path().join("doc.transcript.json");
        transcript_of(&["Email", "jane@example.com", "from", "10.0.0.7"])
            .save(&transcript)
            .unwrap();

        redactor_cmd()
            .args(["classify", "--no-inference"])
            .arg(&transcript)
            .assert()
            .success()
            .stdout(predicate::str::contains("Tagged 2 PII word(s)"));

        let tagged =
            pii_redactor::TaggedTranscript::load(&dir.path().join("doc.tagged.json")).unwrap();
        assert_eq!(tagged.flagged_count(), 2);
    }

    #[test]
    fn test_missing_transcript() {
        redactor_cmd()
            .args(["classify", "--no-inference", "/nonexistent/doc.transcript.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not exist"));
    }

    #[test]
    fn test_corrupt_transcript() {
        let dir = TempDir::new().unwrap();
        let transcript = dir.path().join("doc.transcript.json");
        fs::write(&transcript, "[1, 2, 3]").unwrap();

        redactor_cmd()
            .args(["classify", "--no-inference"])
            .arg(&transcript)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cannot load transcript"));
    }
}

mod redact {
    use super::*;

    #[test]
    fn test_redacts_and_writes_report() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();
        let tagged = dir.path().join("sheet.tagged.json");
        contact_sheet_tagging().save(&tagged).unwrap();
        let output = dir.path().join("sheet.redacted.pdf");

        redactor_cmd()
            .arg("redact")
            .arg(&input)
            .arg(&tagged)
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("Successfully redacted 1 box(es)"));

        assert_redacted(&output, "jane@example.com");
        assert!(dir.path().join("sheet.redacted.report.json").is_file());

        redactor_cmd()
            .arg("verify")
            .arg(&output)
            .arg(&tagged)
            .assert()
            .success();
    }

    #[test]
    fn test_verbose_names_strategy() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();
        let tagged = dir.path().join("sheet.tagged.json");
        contact_sheet_tagging().save(&tagged).unwrap();

        redactor_cmd()
            .args(["--verbose", "redact"])
            .arg(&input)
            .arg(&tagged)
            .arg(dir.path().join("sheet.redacted.pdf"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Strategy: SecureRedaction"));
    }

    #[test]
    fn test_page_out_of_range_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();
        let tagged = dir.path().join("sheet.tagged.json");
        tagged_transcript(vec![tagged_page(
            5,
            vec![tagged_word_at_top("jane@example.com")],
        )])
        .save(&tagged)
        .unwrap();
        let output = dir.path().join("sheet.redacted.pdf");

        redactor_cmd()
            .arg("redact")
            .arg(&input)
            .arg(&tagged)
            .arg(&output)
            .assert()
            .failure()
            .stderr(predicate::str::contains("references page 5"));
        assert!(!output.exists());
    }

    #[test]
    fn test_types_filter_can_skip_everything() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();
        let tagged = dir.path().join("sheet.tagged.json");
        contact_sheet_tagging().save(&tagged).unwrap();
        let output = dir.path().join("sheet.redacted.pdf");

        redactor_cmd()
            .args(["redact", "--types", "phone"])
            .arg(&input)
            .arg(&tagged)
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("No PII found to redact"));
        assert_preserved(&output, "jane@example.com");
    }

    #[test]
    fn test_verify_flags_unredacted_document() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();
        let tagged = dir.path().join("sheet.tagged.json");
        contact_sheet_tagging().save(&tagged).unwrap();

        redactor_cmd()
            .arg("verify")
            .arg(&input)
            .arg(&tagged)
            .assert()
            .failure()
            .stdout(predicate::str::contains("leaked: jane@example.com"));
    }
}

mod extract_text {
    use super::*;

    #[test]
    fn test_text_to_stdout() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();

        redactor_cmd()
            .arg("extract-text")
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("Invoice"));
    }

    #[test]
    fn test_text_to_file() {
        let dir = TempDir::new().unwrap();
        let input = create_contact_sheet(&dir.path().join("sheet.pdf")).unwrap();
        let output = dir.path().join("sheet.txt");

        redactor_cmd()
            .arg("extract-text")
            .arg(&input)
            .arg("--output")
            .arg(&output)
            .assert()
            .success();
        assert!(fs::read_to_string(&output).unwrap().contains("jane@example.com"));
    }

    #[test]
    fn test_missing_input() {
        redactor_cmd()
            .args(["extract-text", "/nonexistent/file.pdf"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not exist"));
    }
}

fn tagged_word_at_top(text: &str) -> pii_redactor::domain::TaggedWord {
    tagged(
        text,
        pii_redactor::domain::PixelBox::new(10, 10, 80, 14),
        pii_redactor::Category::Email,
    )
}
