// 📇 Input index
//
// `_all.csv` written by the listing scraper: one line per filer,
// `surname,name,link,folder,pdf,csv`. Columns are read by position.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DisclosureError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub surname: String,
    pub given_name: String,
    pub link: String,
    pub folder: PathBuf,
    pub pdf_file: String,
    pub txt_file: String,
    /// Line in the index file (header is line 1)
    pub line_number: usize,
}

impl IndexEntry {
    pub fn pdf_path(&self) -> PathBuf {
        self.folder.join("pdf").join(&self.pdf_file)
    }

    pub fn txt_path(&self) -> PathBuf {
        self.folder.join("txt").join(&self.txt_file)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.given_name)
    }
}

pub fn load_index(path: &Path) -> Result<Vec<IndexEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open index file: {}", path.display()))?;

    let mut entries = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let line_number = idx + 2;
        let record = result
            .with_context(|| format!("Failed to parse index line {} in {}", line_number, path.display()))?;

        // Blank trailing lines
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if record.len() < 6 {
            return Err(DisclosureError::Index {
                line: line_number,
                message: format!("expected 6 columns, found {}", record.len()),
            }
            .into());
        }

        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        entries.push(IndexEntry {
            surname: field(0),
            given_name: field(1),
            link: field(2),
            folder: PathBuf::from(field(3)),
            pdf_file: field(4),
            txt_file: field(5),
            line_number,
        });
    }

    Ok(entries)
}
