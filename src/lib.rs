// Pothen Esxes - Asset Disclosure Interpreter
// Turns extracted disclosure-form tables into one summary row per filer

pub mod error;
pub mod normalize;
pub mod currency;
pub mod table;
pub mod profile;
pub mod sections;       // Income/savings, loans, real estate, securities
pub mod identity;
pub mod summary;
pub mod collaborators;  // Table extractor + text layer seams
pub mod index;
pub mod dump;
pub mod batch;

// Re-export commonly used types
pub use error::DisclosureError;
pub use normalize::{
    to_uppercase_fold, normalize_markup, normalize_cell,
    parse_amount, format_number, format_money,
};
pub use currency::{CurrencyEntry, CurrencyTable, Conversion, EURO_NAME};
pub use table::{PageTable, Row, RowAnomaly, find_column};
pub use profile::FormProfile;
pub use sections::{
    Section, SectionSubtotals, ExtractionContext, Issue, IssueKind,
    IncomeSavings, Loans, LoanTerm, RealEstate, Securities,
};
pub use identity::{IdentityRecord, tokenize, extract_identity};
pub use summary::{PersonSummary, SummaryRow, SUMMARY_COLUMNS, BatchTotals, write_summary};
pub use collaborators::{TableSource, TextLayer, JsonTableSource, SidecarTextLayer};
#[cfg(feature = "pdf")]
pub use collaborators::LopdfTextLayer;
pub use index::{IndexEntry, load_index};
pub use batch::{
    BatchConfig, BatchReport, StalledExtractions,
    process_document, run_batch, batch_runtime, shutdown_runtime,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
