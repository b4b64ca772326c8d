// 🔌 PDF collaborators
//
// The interpreter consumes two capabilities it does not implement: a table
// extractor (PDF → page tables) and a text layer (PDF page → ordered text
// fragments). Both are traits so the batch driver and the tests can swap
// the backing implementation.

use crate::table::PageTable;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

// ============================================================================
// TRAITS
// ============================================================================

/// Capability A: ordered page tables of one document
pub trait TableSource: Send + Sync {
    fn page_tables(&self, pdf: &Path) -> Result<Vec<PageTable>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Capability B: text fragments of one page, in rendering order
pub trait TextLayer: Send + Sync {
    /// `page` is 1-based
    fn page_text(&self, pdf: &Path, page: u32) -> Result<Vec<String>>;

    fn name(&self) -> &str;
}

// ============================================================================
// JSON TABLE SOURCE (pdf-table-extractor output)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractorOutput {
    page_tables: Vec<ExtractorPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractorPage {
    page: usize,
    #[serde(default)]
    tables: Vec<Vec<String>>,
}

/// Parse `{"pageTables":[{"page":1,"tables":[[...],...]},...]}`
pub fn parse_table_json<R: Read>(reader: R) -> Result<Vec<PageTable>> {
    let output: ExtractorOutput =
        serde_json::from_reader(reader).context("Failed to parse table extractor JSON")?;

    Ok(output
        .page_tables
        .into_iter()
        .map(|p| PageTable::new(p.page, p.tables))
        .collect())
}

/// Reads the table extractor's JSON written next to the PDF
pub struct JsonTableSource {
    extension: String,
}

impl JsonTableSource {
    pub fn new(extension: impl Into<String>) -> Self {
        JsonTableSource {
            extension: extension.into(),
        }
    }

    pub fn sidecar_path(&self, pdf: &Path) -> PathBuf {
        pdf.with_extension(&self.extension)
    }
}

impl Default for JsonTableSource {
    fn default() -> Self {
        JsonTableSource::new("json")
    }
}

impl TableSource for JsonTableSource {
    fn page_tables(&self, pdf: &Path) -> Result<Vec<PageTable>> {
        let path = self.sidecar_path(pdf);
        let file = File::open(&path)
            .with_context(|| format!("Failed to open table file: {}", path.display()))?;

        parse_table_json(BufReader::new(file))
            .with_context(|| format!("Failed to read tables from {}", path.display()))
    }

    fn name(&self) -> &str {
        "json-tables"
    }
}

// ============================================================================
// TEXT LAYERS
// ============================================================================

/// Pre-extracted text, one fragment per line, in `<pdf stem>.p<page>.txt`
pub struct SidecarTextLayer;

impl SidecarTextLayer {
    pub fn sidecar_path(pdf: &Path, page: u32) -> PathBuf {
        pdf.with_extension(format!("p{}.txt", page))
    }
}

impl TextLayer for SidecarTextLayer {
    fn page_text(&self, pdf: &Path, page: u32) -> Result<Vec<String>> {
        let path = SidecarTextLayer::sidecar_path(pdf, page);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read text layer: {}", path.display()))?;

        Ok(text.lines().map(str::to_string).collect())
    }

    fn name(&self) -> &str {
        "sidecar-text"
    }
}

/// Text layer read straight from the PDF content streams
#[cfg(feature = "pdf")]
pub struct LopdfTextLayer;

#[cfg(feature = "pdf")]
impl TextLayer for LopdfTextLayer {
    fn page_text(&self, pdf: &Path, page: u32) -> Result<Vec<String>> {
        let document = lopdf::Document::load(pdf)
            .with_context(|| format!("Failed to load PDF: {}", pdf.display()))?;

        let text = document
            .extract_text(&[page])
            .with_context(|| format!("Failed to extract text of page {} from {}", page, pdf.display()))?;

        Ok(text.lines().map(str::to_string).collect())
    }

    fn name(&self) -> &str {
        "lopdf"
    }
}

// ============================================================================
// TESTS
// ============================================================================
