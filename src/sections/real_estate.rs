// 🏠 Real estate
//
// The area fields depend on the property type: built + land area for most
// rows, a single combined field for the rest. A zero primary sum falls back
// to the combined field.

use super::{ExtractionContext, Issue, Section};
use crate::normalize::parse_amount;
use crate::table::PageTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealEstate {
    pub properties: usize,
    /// Square metres
    pub area: f64,
    pub issues: Vec<Issue>,
}

pub fn extract(tables: &[PageTable], ctx: &ExtractionContext<'_>) -> RealEstate {
    let profile = ctx.profile;
    let [built, land] = profile.area.primary;
    let mut out = RealEstate::default();

    for table in tables {
        if table.column(profile.property_label).is_none() {
            continue;
        }

        for row in table.data_rows() {
            out.properties += 1;

            let primary = [row.cell(built), row.cell(land)]
                .into_iter()
                .flatten()
                .filter_map(parse_amount)
                .sum::<f64>();

            let area = if primary != 0.0 {
                primary
            } else {
                ctx.require(Section::RealEstate, &row, profile.area.fallback, &mut out.issues)
                    .and_then(parse_amount)
                    .unwrap_or(0.0)
            };

            out.area += area;
        }
    }

    out
}
