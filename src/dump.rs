// 📝 Auxiliary table dump
//
// Per filer, a plain-text copy of every extracted table with normalized
// cells. Kept for manual review of what the extractors saw.

use crate::error::{DisclosureError, Result};
use crate::normalize::normalize_cell;
use crate::table::PageTable;
use std::path::Path;

/// `"CELL","CELL"` per row, blank line after each table
pub fn render_tables(tables: &[PageTable]) -> String {
    let mut out = String::new();

    for table in tables {
        for row in &table.rows {
            let line = row
                .iter()
                .map(|cell| format!("\"{}\"", normalize_cell(cell)))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

pub fn write_dump(path: &Path, tables: &[PageTable]) -> Result<()> {
    std::fs::write(path, render_tables(tables)).map_err(|source| DisclosureError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table;

    #[test]
    fn test_render_tables() {
        let tables = vec![
            table(1, &[&["Είδος\nακινήτου", "Ποσό"], &["Διαμέρισμα", "1.000,00"]]),
            table(2, &[&["Α/Α"]]),
        ];

        let text = render_tables(&tables);
        assert_eq!(
            text,
            "\"ΕΙΔΟΣ ΑΚΙΝΗΤΟΥ\",\"ΠΟΣΟ\"\n\"ΔΙΑΜΕΡΙΣΜΑ\",\"1.000,00\"\n\n\"Α / Α\"\n\n"
        );
    }

    #[test]
    fn test_write_dump_into_missing_dir_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("x.txt");
        let err = write_dump(&path, &[]).unwrap_err();
        assert!(matches!(err, DisclosureError::Write { .. }));
    }
}
