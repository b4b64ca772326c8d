// 🏦 Loans
//
// The form prints the consolidated liabilities ledger on its last page, so
// only the last table is read.

use super::{log_conversion, ExtractionContext, Issue, Section};
use crate::normalize::amount_or_zero;
use crate::table::PageTable;
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loans {
    pub principal: f64,
    pub due: f64,
    /// One entry per ledger row, blanks kept
    pub terms: Vec<LoanTerm>,
    pub issues: Vec<Issue>,
}

/// Dates of one liability; `None` marks a blank cell on the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerm {
    pub row: usize,
    pub incurred: Option<String>,
    pub matures: Option<String>,
}

impl LoanTerm {
    pub fn incurred_on(&self) -> Option<NaiveDate> {
        self.incurred.as_deref().and_then(parse_form_date)
    }

    pub fn matures_on(&self) -> Option<NaiveDate> {
        self.matures.as_deref().and_then(parse_form_date)
    }

    pub fn is_undated(&self) -> bool {
        self.incurred.is_none() && self.matures.is_none()
    }
}

impl Loans {
    pub fn incurred_dates(&self) -> Vec<&str> {
        self.terms.iter().filter_map(|t| t.incurred.as_deref()).collect()
    }

    pub fn maturity_dates(&self) -> Vec<&str> {
        self.terms.iter().filter_map(|t| t.matures.as_deref()).collect()
    }

    /// Filled date cells that are not a form date, as (row, cell)
    pub fn unreadable_dates(&self) -> Vec<(usize, &str)> {
        let mut out = Vec::new();
        for term in &self.terms {
            if let (Some(cell), None) = (term.incurred.as_deref(), term.incurred_on()) {
                out.push((term.row, cell));
            }
            if let (Some(cell), None) = (term.matures.as_deref(), term.matures_on()) {
                out.push((term.row, cell));
            }
        }
        out
    }
}

fn parse_form_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s.trim(), "%d-%m-%Y"))
        .ok()
}

fn non_blank(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn extract(tables: &[PageTable], ctx: &ExtractionContext<'_>) -> Loans {
    let columns = &ctx.profile.loans;
    let mut out = Loans::default();

    let Some(ledger) = tables.last() else {
        return out;
    };

    for row in ledger.data_rows() {
        out.terms.push(LoanTerm {
            row: row.index,
            incurred: non_blank(row.cell(columns.incurred)),
            matures: non_blank(row.cell(columns.matures)),
        });

        let section = Section::Loans;
        let Some(principal_cell) = ctx.require(section, &row, columns.principal, &mut out.issues) else {
            continue;
        };
        let Some(currency_cell) = ctx.require(section, &row, columns.currency, &mut out.issues) else {
            continue;
        };
        let Some(due_cell) = ctx.require(section, &row, columns.due, &mut out.issues) else {
            continue;
        };
        let Some(conversion) = ctx.convert(section, &row, currency_cell, &mut out.issues) else {
            continue;
        };

        let principal = amount_or_zero(principal_cell);
        let due = amount_or_zero(due_cell);
        log_conversion(section, &conversion, principal, conversion.apply(principal));
        log_conversion(section, &conversion, due, conversion.apply(due));

        out.principal += conversion.apply(principal);
        out.due += conversion.apply(due);
    }

    for (row, cell) in out.unreadable_dates() {
        warn!("LOANS page {} row {}: unreadable date \"{}\"", ledger.page, row, cell);
    }
    let undated = out.terms.iter().filter(|t| t.is_undated()).count();
    if undated > 0 {
        debug!("LOANS page {}: {} liabilities without dates", ledger.page, undated);
    }

    out
}
