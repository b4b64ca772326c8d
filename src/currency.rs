// 💱 Currency Table & Conversion
//
// Static year-end reference rates (foreign unit → EUR). A disclosure filed in
// year Y reports balances of Y-1, so conversion always uses the Y-1 rate.
//
// Each entry owns its accepted spellings. When several entries match, the
// longest matching spelling wins: "ΔΟΛΑΡΙΟ ΚΑΝΑΔΑ" is CAD even though USD
// accepts a bare "ΔΟΛΑΡΙΟ".

use crate::error::{DisclosureError, Result};
use crate::normalize::to_uppercase_fold;
use lazy_static::lazy_static;
use log::debug;
use regex::RegexSet;
use serde::Serialize;

/// Spelling of the reporting currency on the form
pub const EURO_NAME: &str = "ΕΥΡΩ";

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyEntry {
    pub symbol: &'static str,
    /// Accepted spellings, already folded to uppercase without accents
    pub names: &'static [&'static str],
    /// (year, EUR multiplier at year end)
    pub rates: &'static [(i32, f64)],
}

impl CurrencyEntry {
    pub fn rate_for(&self, year: i32) -> Option<f64> {
        self.rates
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, mult)| *mult)
    }
}

/// Resolved multiplier for one currency cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conversion {
    pub symbol: &'static str,
    pub multiplier: f64,
}

impl Conversion {
    pub const EURO: Conversion = Conversion {
        symbol: "EUR",
        multiplier: 1.0,
    };

    pub fn apply(&self, amount: f64) -> f64 {
        amount * self.multiplier
    }

    pub fn is_identity(&self) -> bool {
        self.symbol == "EUR"
    }
}

// ============================================================================
// STATIC DATA (2015-2019 revision)
// ============================================================================

pub static CURRENCIES_2015_2019: &[CurrencyEntry] = &[
    CurrencyEntry {
        symbol: "BGN",
        names: &["ΛΕΒ"],
        rates: &[(2015, 0.5129), (2016, 0.5107), (2017, 0.5118), (2018, 0.5109), (2019, 0.5134)],
    },
    CurrencyEntry {
        symbol: "USD",
        names: &["ΔΟΛΑΡΙΟ ΗΠΑ", "ΔΟΛΑΡΙΟ", "ΗΠΑ"],
        rates: &[(2015, 0.8271), (2016, 0.9193), (2017, 0.9504), (2018, 0.8325), (2019, 0.8724)],
    },
    CurrencyEntry {
        symbol: "RUB",
        names: &["ΡΟΥΒΛΙ ΡΩΣΙΑΣ"],
        rates: &[(2015, 0.014), (2016, 0.0126), (2017, 0.0155), (2018, 0.0144), (2019, 0.0126)],
    },
    CurrencyEntry {
        symbol: "CAD",
        names: &["ΔΟΛΑΡΙΟ ΚΑΝΑΔΑ"],
        rates: &[(2015, 0.712), (2016, 0.6641), (2017, 0.7071), (2018, 0.6631), (2019, 0.6402)],
    },
    CurrencyEntry {
        symbol: "GBP",
        names: &["ΒΡΕΤΑΝΙΚΗ ΛΙΡΑ"],
        rates: &[(2015, 1.2888), (2016, 1.356), (2017, 1.1733), (2018, 1.125), (2019, 1.1125)],
    },
    CurrencyEntry {
        symbol: "AUD",
        names: &["ΔΟΛΑΡΙΟ ΑΥΣΤΡΑΛΙΑΣ", "ΔΟΛΑΡΙΟ ΑΥΣΤΡΑΛΙΑ", "ΑΥΣΤΡΑΛΙΑΣ"],
        rates: &[(2015, 0.6765), (2016, 0.6701), (2017, 0.6843), (2018, 0.6491), (2019, 0.6148)],
    },
    CurrencyEntry {
        symbol: "CHF",
        names: &["ΕΛΒΕΤΙΚΟ ΦΡΑΓΚΟ"],
        rates: &[(2015, 0.8318), (2016, 0.9205), (2017, 0.933), (2018, 0.8543), (2019, 0.8883)],
    },
    CurrencyEntry {
        symbol: "SEK",
        names: &["ΚΟΡΟΝΑ ΣΟΥΗΔΙΑΣ", "ΚΟΡΟΝΑ ΣΟΥΗΔΙΑ"],
        rates: &[(2015, 0.1057), (2016, 0.1089), (2017, 0.1044), (2018, 0.1018), (2019, 0.0983)],
    },
    CurrencyEntry {
        symbol: "RON",
        names: &["ΝΕΟ ΡΟΥΜΑΝΙΚΟ ΛΕΟΥ", "ΝΕΟ ΡΟΥΜΑΝΙΚΟ ΛΕΟ"],
        rates: &[(2015, 0.2234), (2016, 0.2208), (2017, 0.2204), (2018, 0.2142), (2019, 0.215)],
    },
    CurrencyEntry {
        symbol: "RSD",
        names: &["ΔΗΝΑΡΙΟ ΣΕΡΒΙΑΣ"],
        rates: &[(2015, 0.0082), (2016, 0.00814), (2017, 0.00846), (2018, 0.00848), (2019, 0.0084)],
    },
    CurrencyEntry {
        symbol: "JPY",
        names: &["ΓΙΕΝ"],
        rates: &[(2015, 0.0069), (2016, 0.0076), (2017, 0.0081), (2018, 0.0074), (2019, 0.008)],
    },
    CurrencyEntry {
        symbol: "NOK",
        names: &["ΚΟΡΟΝΑ ΝΟΡΒΗΓΙΑΣ", "ΚΟΡΟΝΑ ΝΟΡΒΗΓΙΑ"],
        rates: &[(2015, 0.1108), (2016, 0.1039), (2017, 0.1102), (2018, 0.1016), (2019, 0.1009)],
    },
    CurrencyEntry {
        symbol: "ZAR",
        names: &["ΡΑΝΤ"],
        rates: &[(2015, 0.0715), (2016, 0.0594), (2017, 0.0692), (2018, 0.0671), (2019, 0.0606)],
    },
    CurrencyEntry {
        symbol: "BYN",
        names: &["ΡΟΥΒΛΙ ΛΕΥΚΟΡΩΣΙΑΣ"],
        rates: &[(2015, 0.50), (2016, 0.49), (2017, 0.42), (2018, 0.40), (2019, 0.40)],
    },
    CurrencyEntry {
        symbol: "TRY",
        names: &["ΝΕΑ ΤΟΥΡΚΙΚΗ ΛΙΡΑ"],
        rates: &[(2015, 0.3545), (2016, 0.3151), (2017, 0.2696), (2018, 0.2195), (2019, 0.1649)],
    },
];

lazy_static! {
    static ref STANDARD: CurrencyTable = CurrencyTable::new(CURRENCIES_2015_2019).unwrap();
}

// ============================================================================
// CURRENCY TABLE
// ============================================================================

pub struct CurrencyTable {
    entries: &'static [CurrencyEntry],
    matcher: RegexSet,
    /// Per pattern in `matcher`: (entry index, spelling length in chars)
    spellings: Vec<(usize, usize)>,
}

impl CurrencyTable {
    pub fn new(entries: &'static [CurrencyEntry]) -> std::result::Result<Self, regex::Error> {
        let mut patterns = Vec::new();
        let mut spellings = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            for name in entry.names {
                patterns.push(regex::escape(name));
                spellings.push((idx, name.chars().count()));
            }
        }

        Ok(CurrencyTable {
            entries,
            matcher: RegexSet::new(&patterns)?,
            spellings,
        })
    }

    /// The built-in 2015-2019 table
    pub fn standard() -> &'static CurrencyTable {
        &STANDARD
    }

    pub fn entries(&self) -> &[CurrencyEntry] {
        self.entries
    }

    /// Find the entry for a currency cell, most specific spelling first
    pub fn lookup(&self, raw_name: &str) -> Option<&CurrencyEntry> {
        let folded = to_uppercase_fold(&clean_name(raw_name));

        self.matcher
            .matches(&folded)
            .iter()
            .map(|pattern| self.spellings[pattern])
            // Longest spelling wins, earlier entry on ties
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(entry, _)| &self.entries[entry])
    }

    /// Multiplier for a currency cell in a form filed in `disclosure_year`
    pub fn resolve(&self, raw_name: &str, disclosure_year: i32) -> Result<Conversion> {
        let name = to_uppercase_fold(&clean_name(raw_name));

        if name.is_empty() || name == EURO_NAME {
            return Ok(Conversion::EURO);
        }

        let entry = self
            .lookup(&name)
            .ok_or_else(|| DisclosureError::MissingCurrency { name: name.clone() })?;

        let reference_year = disclosure_year - 1;
        let multiplier = entry
            .rate_for(reference_year)
            .ok_or_else(|| DisclosureError::MissingRate {
                symbol: entry.symbol.to_string(),
                year: reference_year,
            })?;

        debug!("Resolved \"{}\" to {} @ {} ({})", name, entry.symbol, multiplier, reference_year);

        Ok(Conversion {
            symbol: entry.symbol,
            multiplier,
        })
    }
}

fn clean_name(raw: &str) -> String {
    raw.replace(['\r', '\n'], "").trim().to_string()
}

// ============================================================================
// TESTS
// ============================================================================
