// 🧮 Section Extractors
//
// Four independent passes over the same page tables. Each one is skippable:
// a form without the section yields a zero subtotal. Amounts are converted
// row by row, since every row may carry its own currency.

pub mod income;
pub mod loans;
pub mod real_estate;
pub mod securities;

pub use income::IncomeSavings;
pub use loans::{LoanTerm, Loans};
pub use real_estate::RealEstate;
pub use securities::Securities;

use crate::currency::Conversion;
use crate::error::DisclosureError;
use crate::profile::FormProfile;
use crate::table::{PageTable, Row, RowAnomaly};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SECTION + ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    Income,
    Savings,
    Loans,
    RealEstate,
    Securities,
}

impl Section {
    pub fn code(&self) -> &str {
        match self {
            Section::Income => "INCOME",
            Section::Savings => "SAVINGS",
            Section::Loans => "LOANS",
            Section::RealEstate => "REAL_ESTATE",
            Section::Securities => "SECURITIES",
        }
    }
}

/// Something that made a subtotal incomplete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub section: Section,
    pub page: usize,
    pub row: usize,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Currency spelling not in the static table
    MissingCurrency { name: String },
    /// Currency known, no rate for the reference year
    MissingRate { symbol: String, year: i32 },
    /// Row narrower than a column the layout needs
    ShortRow { column: usize, width: usize },
    /// Header resolved, but a derived column falls outside the table
    Layout { detail: String },
}

impl Issue {
    fn short_row(section: Section, anomaly: RowAnomaly) -> Self {
        Issue {
            section,
            page: anomaly.page,
            row: anomaly.row,
            kind: IssueKind::ShortRow {
                column: anomaly.column,
                width: anomaly.width,
            },
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} p{} r{}: ", self.section.code(), self.page, self.row)?;
        match &self.kind {
            IssueKind::MissingCurrency { name } => write!(f, "missing currency \"{}\"", name),
            IssueKind::MissingRate { symbol, year } => write!(f, "no {} rate for {}", symbol, year),
            IssueKind::ShortRow { column, width } => {
                write!(f, "column {} missing ({} cells)", column, width)
            }
            IssueKind::Layout { detail } => write!(f, "{}", detail),
        }
    }
}

// ============================================================================
// EXTRACTION CONTEXT
// ============================================================================

/// What every extractor needs besides the tables
pub struct ExtractionContext<'a> {
    pub disclosure_year: i32,
    pub profile: &'a FormProfile,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(disclosure_year: i32, profile: &'a FormProfile) -> Self {
        ExtractionContext {
            disclosure_year,
            profile,
        }
    }

    /// Resolve a row's currency cell; gaps are recorded, not raised
    pub(crate) fn convert(
        &self,
        section: Section,
        row: &Row<'_>,
        currency_cell: &str,
        issues: &mut Vec<Issue>,
    ) -> Option<Conversion> {
        match self
            .profile
            .currencies
            .resolve(currency_cell, self.disclosure_year)
        {
            Ok(conversion) => Some(conversion),
            Err(err) => {
                if err.is_coverage_gap() {
                    warn!("{} page {} row {}: {}", section.code(), row.page, row.index, err);
                } else {
                    error!("{} page {} row {}: {}", section.code(), row.page, row.index, err);
                }
                let kind = match err {
                    DisclosureError::MissingCurrency { name } => IssueKind::MissingCurrency { name },
                    DisclosureError::MissingRate { symbol, year } => {
                        IssueKind::MissingRate { symbol, year }
                    }
                    other => IssueKind::Layout {
                        detail: other.to_string(),
                    },
                };
                issues.push(Issue {
                    section,
                    page: row.page,
                    row: row.index,
                    kind,
                });
                None
            }
        }
    }

    /// Fetch a required cell; a short row becomes an issue
    pub(crate) fn require<'r>(
        &self,
        section: Section,
        row: &Row<'r>,
        column: usize,
        issues: &mut Vec<Issue>,
    ) -> Option<&'r str> {
        match row.require(column) {
            Ok(cell) => Some(cell),
            Err(anomaly) => {
                warn!("{}: {}", section.code(), anomaly);
                issues.push(Issue::short_row(section, anomaly));
                None
            }
        }
    }
}

pub(crate) fn log_conversion(section: Section, conversion: &Conversion, raw: f64, converted: f64) {
    if !conversion.is_identity() {
        debug!(
            "{} Convert {} to EUR => {} => {}",
            section.code(),
            conversion.symbol,
            raw,
            converted
        );
    }
}

// ============================================================================
// ALL SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionSubtotals {
    pub income_savings: IncomeSavings,
    pub loans: Loans,
    pub real_estate: RealEstate,
    pub securities: Securities,
}

impl SectionSubtotals {
    pub fn extract(tables: &[PageTable], ctx: &ExtractionContext<'_>) -> Self {
        SectionSubtotals {
            income_savings: income::extract(tables, ctx),
            loans: loans::extract(tables, ctx),
            real_estate: real_estate::extract(tables, ctx),
            securities: securities::extract(tables, ctx),
        }
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.income_savings
            .issues
            .iter()
            .chain(self.loans.issues.iter())
            .chain(self.real_estate.issues.iter())
            .chain(self.securities.issues.iter())
    }

    pub fn is_complete(&self) -> bool {
        self.issues().next().is_none()
    }
}
