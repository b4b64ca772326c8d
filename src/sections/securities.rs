// 📈 Securities
//
// Located by the valuation column. Currency sits two columns after it and
// the quantity three before. Rows whose currency cell is the subtotal marker
// are generated by the form and are not holdings.

use super::{log_conversion, ExtractionContext, Issue, IssueKind, Section};
use crate::normalize::amount_or_zero;
use crate::table::PageTable;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Securities {
    pub valuation: f64,
    pub quantity: f64,
    /// Holding rows summed (subtotal rows excluded)
    pub lots: usize,
    pub issues: Vec<Issue>,
}

pub fn extract(tables: &[PageTable], ctx: &ExtractionContext<'_>) -> Securities {
    let profile = ctx.profile;
    let offsets = &profile.securities;
    let section = Section::Securities;
    let mut out = Securities::default();

    for table in tables {
        let Some(valuation_col) = table.column(profile.valuation_label) else {
            continue;
        };
        let currency_col = valuation_col + offsets.currency_after;

        let Some(quantity_col) = valuation_col.checked_sub(offsets.quantity_before) else {
            warn!(
                "Valuation column {} on page {} leaves no room for quantity",
                valuation_col, table.page
            );
            out.issues.push(Issue {
                section,
                page: table.page,
                row: 0,
                kind: IssueKind::Layout {
                    detail: format!("valuation at column {} has no quantity column", valuation_col),
                },
            });
            continue;
        };

        for row in table.data_rows() {
            let Some(currency_cell) = ctx.require(section, &row, currency_col, &mut out.issues) else {
                continue;
            };
            if currency_cell.trim() == profile.subtotal_marker {
                continue;
            }

            let Some(valuation_cell) = ctx.require(section, &row, valuation_col, &mut out.issues) else {
                continue;
            };
            let Some(conversion) = ctx.convert(section, &row, currency_cell, &mut out.issues) else {
                continue;
            };

            let valuation = amount_or_zero(valuation_cell);
            let quantity = row.cell(quantity_col).map(amount_or_zero).unwrap_or(0.0);
            log_conversion(section, &conversion, valuation, conversion.apply(valuation));

            out.valuation += conversion.apply(valuation);
            out.quantity += conversion.apply(quantity);
            out.lots += 1;
        }
    }

    out
}
