// 📋 Page tables + column resolution
//
// A PageTable is the grid the table-extraction collaborator produced for one
// page. Row 0 is the header. Rows are NOT guaranteed to share the header's
// width, so every cell access goes through `Row::cell` / `Row::require`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PAGE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTable {
    /// 1-based page number in the source PDF
    pub page: usize,
    pub rows: Vec<Vec<String>>,
}

impl PageTable {
    pub fn new(page: usize, rows: Vec<Vec<String>>) -> Self {
        PageTable { page, rows }
    }

    /// Header row, empty when the table has no rows at all
    pub fn header(&self) -> &[String] {
        self.rows.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Position of `label` in the header
    pub fn column(&self, label: &str) -> Option<usize> {
        find_column(self.header(), label)
    }

    /// Every row after the header
    pub fn data_rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().skip(1).map(move |(index, cells)| Row {
            page: self.page,
            index,
            cells,
        })
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// First exact match of `label` in a header row.
///
/// Total: `None` means "this table does not carry the section", never an error.
pub fn find_column(header: &[String], label: &str) -> Option<usize> {
    header.iter().position(|cell| cell == label)
}

// ============================================================================
// ROW ACCESS
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub page: usize,
    /// Index within the table (header is 0)
    pub index: usize,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Optional field: `None` when the row is too short for this column
    pub fn cell(&self, column: usize) -> Option<&'a str> {
        self.cells.get(column).map(|c| c.as_str())
    }

    /// Required field: a short row is a parse anomaly, not an empty cell
    pub fn require(&self, column: usize) -> Result<&'a str, RowAnomaly> {
        self.cell(column).ok_or(RowAnomaly {
            page: self.page,
            row: self.index,
            column,
            width: self.width(),
        })
    }
}

/// A row narrower than a column the form layout needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowAnomaly {
    pub page: usize,
    pub row: usize,
    pub column: usize,
    pub width: usize,
}

impl fmt::Display for RowAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {} row {}: column {} missing (row has {} cells)",
            self.page, self.row, self.column, self.width
        )
    }
}

#[cfg(test)]
pub(crate) fn table(page: usize, rows: &[&[&str]]) -> PageTable {
    PageTable::new(
        page,
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

// ============================================================================
// TESTS
// ============================================================================
