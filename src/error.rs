// ⚠️ Domain errors
//
// Extraction failures skip a filer; currency gaps only degrade one record.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisclosureError {
    /// Table or text-layer collaborator failed on a document
    #[error("extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// Currency name not present in the static table
    #[error("missing currency \"{name}\"")]
    MissingCurrency { name: String },

    /// Currency known, but no reference rate for the year
    #[error("no {symbol} rate for year {year}")]
    MissingRate { symbol: String, year: i32 },

    #[error("write failed for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction of {path} timed out after {seconds}s")]
    Timeout { path: PathBuf, seconds: u64 },

    #[error("bad index record at line {line}: {message}")]
    Index { line: usize, message: String },
}

impl DisclosureError {
    pub fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DisclosureError::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for errors that only make a record partial
    pub fn is_coverage_gap(&self) -> bool {
        matches!(
            self,
            DisclosureError::MissingCurrency { .. } | DisclosureError::MissingRate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DisclosureError>;
