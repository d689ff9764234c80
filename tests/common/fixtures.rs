//! Test PDF builders.
//!
//! Text is placed with printpdf at explicit positions so tests can compute
//! where every line lands on the page.

use anyhow::Result;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

#[derive(Debug, Clone)]
struct Line {
    page: usize,
    x_mm: f32,
    y_mm: f32,
    size: f32,
    text: String,
}

/// Builder for multi-page A4 test PDFs.
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_line(0, 20.0, 250.0, "Contact jane@example.com today")
///     .with_pages(3)
///     .build(std::path::Path::new("/tmp/test.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: usize,
    lines: Vec<Line>,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: 1,
            lines: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages.max(1);
        self
    }

    /// Adds a 12 pt line with its baseline `y_mm` above the bottom edge.
    pub fn with_line(mut self, page: usize, x_mm: f32, y_mm: f32, text: &str) -> Self {
        self.pages = self.pages.max(page + 1);
        self.lines.push(Line {
            page,
            x_mm,
            y_mm,
            size: 12.0,
            text: text.to_string(),
        });
        self
    }

    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) = PdfDocument::new(
            &self.title,
            Mm(A4_WIDTH_MM),
            Mm(A4_HEIGHT_MM),
            "Layer 1",
        );
        let mut layers = vec![doc.get_page(page1).get_layer(layer1)];
        for n in 1..self.pages {
            let (page, layer) =
                doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), format!("Layer {}", n + 1));
            layers.push(doc.get_page(page).get_layer(layer));
        }

        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        for line in &self.lines {
            layers[line.page].use_text(&line.text, line.size, Mm(line.x_mm), Mm(line.y_mm), &font);
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One page with an email line at 250 mm and an invoice line at 200 mm.
pub fn create_contact_sheet(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_title("Contact Sheet")
        .with_line(0, 20.0, 250.0, CONTACT_LINE)
        .with_line(0, 20.0, 200.0, INVOICE_LINE)
        .build(path)
}

pub const CONTACT_LINE: &str = "Contact jane@example.com today";
pub const INVOICE_LINE: &str = "Invoice total 42 EUR";
