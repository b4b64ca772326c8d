// 🗂️ Form profiles
//
// The column labels, fixed offsets and currency revision of one layout of the
// disclosure form. Extractors never hard-code an offset; they ask the profile.

use crate::currency::CurrencyTable;
use log::warn;

/// Labels on page 1 that precede the identity values
#[derive(Debug, Clone)]
pub struct IdentityLabels {
    /// Whole-token match
    pub given_name: &'static str,
    /// Whole-token match
    pub surname: &'static str,
    /// Substring match ("ΟΝΟΜΑ ΠΑΤΡΟΣ" is often a single fragment)
    pub fathers_name: &'static str,
}

impl IdentityLabels {
    /// True when `token` is (or contains) one of the label words
    pub fn is_label(&self, token: &str) -> bool {
        token.contains(self.given_name)
            || token.contains(self.surname)
            || token.contains(self.fathers_name)
    }
}

#[derive(Debug, Clone)]
pub struct LoanColumns {
    pub principal: usize,
    pub currency: usize,
    pub due: usize,
    pub incurred: usize,
    pub matures: usize,
}

#[derive(Debug, Clone)]
pub struct AreaColumns {
    /// Summed; built area and land area on most property types
    pub primary: [usize; 2],
    /// Single combined area field used when the primary pair sums to zero
    pub fallback: usize,
}

/// Offsets relative to the valuation column
#[derive(Debug, Clone)]
pub struct SecuritiesOffsets {
    pub currency_after: usize,
    pub quantity_before: usize,
}

#[derive(Clone)]
pub struct FormProfile {
    pub revision: &'static str,
    /// First disclosure year this layout was used for
    pub first_year: i32,

    pub identity: IdentityLabels,

    pub amount_label: &'static str,
    /// Currency cell sits this many columns after the amount
    pub amount_currency_offset: usize,

    pub loans: LoanColumns,

    pub property_label: &'static str,
    pub area: AreaColumns,

    pub valuation_label: &'static str,
    pub securities: SecuritiesOffsets,
    /// Currency cell content of form-generated subtotal rows
    pub subtotal_marker: &'static str,

    pub currencies: &'static CurrencyTable,
}

impl FormProfile {
    /// Layout used from the 2016 filings on
    pub fn revision_2016() -> Self {
        FormProfile {
            revision: "2016",
            first_year: 2016,
            identity: IdentityLabels {
                given_name: "ΟΝΟΜΑ",
                surname: "ΕΠΩΝΥΜΟ",
                fathers_name: "ΠΑΤΡΟΣ",
            },
            amount_label: "ΠΟΣΟ",
            amount_currency_offset: 1,
            loans: LoanColumns {
                principal: 3,
                currency: 4,
                due: 5,
                incurred: 6,
                matures: 7,
            },
            property_label: "ΕΙΔΟΣ \nΑΚΙΝΗΤΟΥ",
            area: AreaColumns {
                primary: [11, 12],
                fallback: 9,
            },
            valuation_label: "ΑΠΟΤΙΜΗΣΗ",
            securities: SecuritiesOffsets {
                currency_after: 2,
                quantity_before: 3,
            },
            subtotal_marker: "Σ",
            currencies: CurrencyTable::standard(),
        }
    }

    /// All known layouts, oldest first
    pub fn revisions() -> Vec<FormProfile> {
        vec![FormProfile::revision_2016()]
    }

    /// Newest layout in force for `disclosure_year`
    pub fn for_year(disclosure_year: i32) -> FormProfile {
        let mut revisions = FormProfile::revisions();
        let position = revisions
            .iter()
            .rposition(|p| p.first_year <= disclosure_year);

        match position {
            Some(idx) => revisions.swap_remove(idx),
            None => {
                warn!(
                    "No form layout known for {}, using revision {}",
                    disclosure_year, revisions[0].revision
                );
                revisions.swap_remove(0)
            }
        }
    }
}

impl std::fmt::Debug for FormProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormProfile")
            .field("revision", &self.revision)
            .field("first_year", &self.first_year)
            .finish()
    }
}
