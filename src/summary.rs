// 📊 Record Assembler & Run Aggregator
//
// PersonSummary = identity + section subtotals + source link. Built once per
// filer and never mutated. BatchTotals is a value folded over the batch.

use crate::identity::IdentityRecord;
use crate::normalize::{format_money, format_number};
use crate::sections::SectionSubtotals;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// PERSON SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub identity: IdentityRecord,
    pub sections: SectionSubtotals,
    pub link: String,
}

impl PersonSummary {
    pub fn assemble(identity: IdentityRecord, sections: SectionSubtotals, link: String) -> Self {
        PersonSummary {
            identity,
            sections,
            link,
        }
    }

    /// Some rows were excluded (unknown currency, short rows, ...)
    pub fn is_partial(&self) -> bool {
        !self.sections.is_complete()
    }

    pub fn notes(&self) -> String {
        self.sections
            .issues()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn to_row(&self) -> SummaryRow {
        let id = &self.identity;
        let s = &self.sections;

        SummaryRow {
            surname: id.surname.clone(),
            given_name: id.given_name.clone(),
            fathers_name: id.fathers_name.clone(),
            spouse_surname: id.spouse_surname.clone(),
            spouse_given_name: id.spouse_given_name.clone(),
            spouse_fathers_name: id.spouse_fathers_name.clone(),
            income: format_money(s.income_savings.income),
            deposits: format_money(s.income_savings.deposits),
            accounts: s.income_savings.accounts,
            loans_principal: format_money(s.loans.principal),
            loans_due: format_money(s.loans.due),
            properties: s.real_estate.properties,
            properties_area: format_number(s.real_estate.area),
            securities_valuation: format_money(s.securities.valuation),
            securities_quantity: format_number(s.securities.quantity),
            link: self.link.clone(),
            notes: self.notes(),
        }
    }
}

/// Column titles of [`SummaryRow`], in file order
pub const SUMMARY_COLUMNS: [&str; 17] = [
    "ΕΠΩΝΥΜΟ",
    "ΟΝΟΜΑ",
    "ΟΝΟΜΑ ΠΑΤΡΟΣ",
    "ΕΠΩΝΥΜΟ (Συζύγου)",
    "ΟΝΟΜΑ (Συζύγου)",
    "ΟΝΟΜΑ ΠΑΤΡΟΣ (Συζύγου)",
    "ΕΣΟΔΑ (Σύνολο)",
    "ΚΑΤΑΘΕΣΕΙΣ (Σύνολο)",
    "ΑΡΙΘΜΟΣ ΤΡΑΠΕΖΙΚΩΝ ΛΟΓΑΡΙΑΣΜΩΝ (Σύνολο)",
    "ΔΑΝΕΙΑ ΑΡΧΙΚΟ ΠΟΣΟ (Σύνολο)",
    "ΔΑΝΕΙΑ ΥΠΟΛΟΙΠΟ ΟΦΕΙΛΟΜΕΝΟ (Σύνολο)",
    "ΑΚΙΝΗΤΑ (Σύνολο)",
    "ΕΠΙΦΑΝΕΙΑ ΣΕ Μ2 (Σύνολο)",
    "ΜΕΤΟΧΕΣ ΑΠΟΤΙΜΗΣΗ (Σύνολο)",
    "ΜΕΤΟΧΕΣ ΠΟΣΟΤΗΤΑ (Σύνολο)",
    "PDF Link",
    "ΣΗΜΕΙΩΣΕΙΣ",
];

/// One output line, column titles as printed on the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "ΕΠΩΝΥΜΟ")]
    pub surname: String,
    #[serde(rename = "ΟΝΟΜΑ")]
    pub given_name: String,
    #[serde(rename = "ΟΝΟΜΑ ΠΑΤΡΟΣ")]
    pub fathers_name: String,
    #[serde(rename = "ΕΠΩΝΥΜΟ (Συζύγου)")]
    pub spouse_surname: String,
    #[serde(rename = "ΟΝΟΜΑ (Συζύγου)")]
    pub spouse_given_name: String,
    #[serde(rename = "ΟΝΟΜΑ ΠΑΤΡΟΣ (Συζύγου)")]
    pub spouse_fathers_name: String,
    #[serde(rename = "ΕΣΟΔΑ (Σύνολο)")]
    pub income: String,
    #[serde(rename = "ΚΑΤΑΘΕΣΕΙΣ (Σύνολο)")]
    pub deposits: String,
    #[serde(rename = "ΑΡΙΘΜΟΣ ΤΡΑΠΕΖΙΚΩΝ ΛΟΓΑΡΙΑΣΜΩΝ (Σύνολο)")]
    pub accounts: usize,
    #[serde(rename = "ΔΑΝΕΙΑ ΑΡΧΙΚΟ ΠΟΣΟ (Σύνολο)")]
    pub loans_principal: String,
    #[serde(rename = "ΔΑΝΕΙΑ ΥΠΟΛΟΙΠΟ ΟΦΕΙΛΟΜΕΝΟ (Σύνολο)")]
    pub loans_due: String,
    #[serde(rename = "ΑΚΙΝΗΤΑ (Σύνολο)")]
    pub properties: usize,
    #[serde(rename = "ΕΠΙΦΑΝΕΙΑ ΣΕ Μ2 (Σύνολο)")]
    pub properties_area: String,
    #[serde(rename = "ΜΕΤΟΧΕΣ ΑΠΟΤΙΜΗΣΗ (Σύνολο)")]
    pub securities_valuation: String,
    #[serde(rename = "ΜΕΤΟΧΕΣ ΠΟΣΟΤΗΤΑ (Σύνολο)")]
    pub securities_quantity: String,
    #[serde(rename = "PDF Link")]
    pub link: String,
    #[serde(rename = "ΣΗΜΕΙΩΣΕΙΣ")]
    pub notes: String,
}

/// Write the batch summary file (header + one row per record)
pub fn write_summary(path: &Path, summaries: &[PersonSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create summary file: {}", path.display()))?;

    // serialize() emits the header with the first row only
    if summaries.is_empty() {
        writer
            .write_record(SUMMARY_COLUMNS)
            .with_context(|| format!("Failed to write summary header: {}", path.display()))?;
    }

    for summary in summaries {
        writer
            .serialize(summary.to_row())
            .with_context(|| format!("Failed to write summary row for {}", summary.link))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush summary file: {}", path.display()))?;
    Ok(())
}

// ============================================================================
// BATCH TOTALS
// ============================================================================

/// Diagnostic running sums; they measure coverage, not audited figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchTotals {
    pub loan_principal: f64,
    pub loan_due: f64,
    pub income: f64,
    pub deposits: f64,
    pub securities_valuation: f64,

    pub processed: usize,
    pub partial: usize,
    pub skipped: usize,
}

impl BatchTotals {
    /// Fold one fully assembled record in
    pub fn absorb(self, summary: &PersonSummary) -> Self {
        let s = &summary.sections;
        BatchTotals {
            loan_principal: self.loan_principal + s.loans.principal,
            loan_due: self.loan_due + s.loans.due,
            income: self.income + s.income_savings.income,
            deposits: self.deposits + s.income_savings.deposits,
            securities_valuation: self.securities_valuation + s.securities.valuation,
            processed: self.processed + 1,
            partial: self.partial + usize::from(summary.is_partial()),
            skipped: self.skipped,
        }
    }

    /// A filer that produced no record
    pub fn skip(self) -> Self {
        BatchTotals {
            skipped: self.skipped + 1,
            ..self
        }
    }

    pub fn report(&self) -> String {
        format!(
            "{} processed ({} partial), {} skipped | income {} | deposits {} | loans {} / due {} | securities {}",
            self.processed,
            self.partial,
            self.skipped,
            format_money(self.income),
            format_money(self.deposits),
            format_money(self.loan_principal),
            format_money(self.loan_due),
            format_money(self.securities_valuation),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{Issue, IssueKind, Section};

    fn summary(income: f64, deposits: f64, principal: f64) -> PersonSummary {
        let mut sections = SectionSubtotals::default();
        sections.income_savings.income = income;
        sections.income_savings.deposits = deposits;
        sections.income_savings.accounts = 2;
        sections.loans.principal = principal;
        sections.loans.due = principal / 2.0;
        sections.real_estate.properties = 1;
        sections.real_estate.area = 95.5;
        sections.securities.valuation = 10.0;
        sections.securities.quantity = 4.0;

        let identity = IdentityRecord {
            given_name: "ΓΙΑΝΝΗΣ".to_string(),
            surname: "ΠΑΠΑΔΟΠΟΥΛΟΣ".to_string(),
            fathers_name: "ΚΩΝΣΤΑΝΤΙΝΟΣ".to_string(),
            ..IdentityRecord::default()
        };

        PersonSummary::assemble(identity, sections, "http://example.gr/a.pdf".to_string())
    }

    #[test]
    fn test_row_formatting() {
        let row = summary(12345.678, 500.0, 0.0).to_row();

        assert_eq!(row.surname, "ΠΑΠΑΔΟΠΟΥΛΟΣ");
        assert_eq!(row.income, "12,345.68 €");
        assert_eq!(row.deposits, "500.00 €");
        assert_eq!(row.accounts, 2);
        assert_eq!(row.loans_principal, "0.00 €");
        assert_eq!(row.properties, 1);
        assert_eq!(row.properties_area, "95.50");
        assert_eq!(row.securities_valuation, "10.00 €");
        assert_eq!(row.securities_quantity, "4.00");
        assert_eq!(row.spouse_surname, "");
        assert_eq!(row.notes, "");
    }

    #[test]
    fn test_partial_record_notes() {
        let mut s = summary(1.0, 0.0, 0.0);
        s.sections.securities.issues.push(Issue {
            section: Section::Securities,
            page: 7,
            row: 2,
            kind: IssueKind::MissingCurrency {
                name: "ΡΕΑΛ".to_string(),
            },
        });

        assert!(s.is_partial());
        assert_eq!(s.to_row().notes, "SECURITIES p7 r2: missing currency \"ΡΕΑΛ\"");
    }

    #[test]
    fn test_totals_fold_is_exact_sum() {
        let records = vec![
            summary(1000.0, 500.0, 200.0),
            summary(250.25, 0.0, 0.0),
            summary(0.0, 99.75, 1000.0),
        ];

        let totals = records
            .iter()
            .fold(BatchTotals::default(), |acc, r| acc.absorb(r))
            .skip();

        assert_eq!(totals.income, 1250.25);
        assert_eq!(totals.deposits, 599.75);
        assert_eq!(totals.loan_principal, 1200.0);
        assert_eq!(totals.loan_due, 600.0);
        assert_eq!(totals.securities_valuation, 30.0);
        assert_eq!(totals.processed, 3);
        assert_eq!(totals.partial, 0);
        assert_eq!(totals.skipped, 1);
    }

    #[test]
    fn test_write_summary_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_sum.csv");

        write_summary(&path, &[summary(1000.0, 0.0, 0.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("ΕΠΩΝΥΜΟ,ΟΝΟΜΑ,ΟΝΟΜΑ ΠΑΤΡΟΣ,ΕΠΩΝΥΜΟ (Συζύγου)"));
        assert!(header.ends_with("PDF Link,ΣΗΜΕΙΩΣΕΙΣ"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("ΠΑΠΑΔΟΠΟΥΛΟΣ,ΓΙΑΝΝΗΣ,ΚΩΝΣΤΑΝΤΙΝΟΣ,,,"));
        assert!(row.contains("\"1,000.00 €\""));
        assert!(lines.next().is_none());
        assert_eq!(header, SUMMARY_COLUMNS.join(","));
    }

    #[test]
    fn test_empty_batch_still_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_sum.csv");

        write_summary(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{}\n", SUMMARY_COLUMNS.join(",")));
    }
}
