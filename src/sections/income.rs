// 💶 Income + savings
//
// Every table carrying the amount column belongs to this section. The first
// one in document order is the income table; the rest list deposit accounts.

use super::{log_conversion, ExtractionContext, Issue, Section};
use crate::normalize::amount_or_zero;
use crate::table::PageTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeSavings {
    pub income: f64,
    pub deposits: f64,
    /// Declared bank accounts (data rows of the savings tables)
    pub accounts: usize,
    pub issues: Vec<Issue>,
}

pub fn extract(tables: &[PageTable], ctx: &ExtractionContext<'_>) -> IncomeSavings {
    let profile = ctx.profile;
    let mut out = IncomeSavings::default();
    let mut amount_tables = 0;

    for table in tables {
        let Some(amount_col) = table.column(profile.amount_label) else {
            continue;
        };
        let currency_col = amount_col + profile.amount_currency_offset;

        let section = if amount_tables == 0 {
            Section::Income
        } else {
            Section::Savings
        };
        amount_tables += 1;

        for row in table.data_rows() {
            if section == Section::Savings {
                out.accounts += 1;
            }

            let Some(amount_cell) = ctx.require(section, &row, amount_col, &mut out.issues) else {
                continue;
            };
            let Some(currency_cell) = ctx.require(section, &row, currency_col, &mut out.issues) else {
                continue;
            };
            let Some(conversion) = ctx.convert(section, &row, currency_cell, &mut out.issues) else {
                continue;
            };

            let raw = amount_or_zero(amount_cell);
            let amount = conversion.apply(raw);
            log_conversion(section, &conversion, raw, amount);

            match section {
                Section::Income => out.income += amount,
                _ => out.deposits += amount,
            }
        }
    }

    out
}
