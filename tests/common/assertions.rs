//! Assertions over the text layer of written PDFs.

use anyhow::Result;
use std::path::Path;

pub fn extract_text(pdf_path: &Path) -> Result<String> {
    let bytes = std::fs::read(pdf_path)?;
    pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| anyhow::anyhow!("Failed to extract text: {}", e))
}

/// Asserts that `pattern` can no longer be extracted from the PDF.
pub fn assert_redacted(pdf_path: &Path, pattern: &str) {
    let text = extract_text(pdf_path).unwrap_or_else(|e| panic!("{}", e));
    assert!(
        !text.contains(pattern),
        "'{}' should be redacted but was found in '{}'",
        pattern,
        pdf_path.display()
    );
}

/// Asserts that `pattern` is still present in the PDF text.
pub fn assert_preserved(pdf_path: &Path, pattern: &str) {
    let text = extract_text(pdf_path).unwrap_or_else(|e| panic!("{}", e));
    assert!(
        text.contains(pattern),
        "'{}' should be preserved but was not found in '{}'",
        pattern,
        pdf_path.display()
    );
}

/// Asserts that the file exists and parses as a PDF.
pub fn assert_valid_pdf(pdf_path: &Path) {
    assert!(pdf_path.exists(), "PDF should exist at '{}'", pdf_path.display());
    assert!(
        lopdf::Document::load(pdf_path).is_ok(),
        "'{}' should be a loadable PDF",
        pdf_path.display()
    );
}
