// Whole-year run over a synthetic folder: index, table JSON, page-1 text

use pothen_esxes::{run_batch, BatchConfig, JsonTableSource, SidecarTextLayer, SummaryRow};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const LEDGER_HEADER: &str = r#"["Α/Α","ΕΙΔΟΣ","ΦΟΡΕΑΣ","ΑΡΧΙΚΟ","ΝΟΜΙΣΜΑ","ΥΠΟΛΟΙΠΟ","ΑΠΟ","ΕΩΣ"]"#;

fn write_filer(pdf_dir: &Path, stem: &str, tables_json: &str, page_one: &str) {
    // The PDF itself is never opened by the sidecar collaborators
    std::fs::write(pdf_dir.join(format!("{stem}.pdf")), b"%PDF-1.4").unwrap();
    std::fs::write(pdf_dir.join(format!("{stem}.json")), tables_json).unwrap();
    std::fs::write(pdf_dir.join(format!("{stem}.p1.txt")), page_one).unwrap();
}

fn setup(root: &Path) -> BatchConfig {
    let year_dir = root.join("2019");
    let pdf_dir = year_dir.join("pdf");
    std::fs::create_dir_all(&pdf_dir).unwrap();

    // Minimal form: income, one savings account, zero-valued loan
    write_filer(
        &pdf_dir,
        "papadopoulos",
        &format!(
            r#"{{"pageTables":[
                {{"page":1,"tables":[["Α/Α","ΠΗΓΗ","ΠΟΣΟ","ΝΟΜΙΣΜΑ"],["1","ΜΙΣΘΟΣ","1000.00","ΕΥΡΩ"]]}},
                {{"page":2,"tables":[["Α/Α","ΤΡΑΠΕΖΑ","ΠΟΣΟ","ΝΟΜΙΣΜΑ"],["1","ΤΡΑΠΕΖΑ","500.00","ΕΥΡΩ"]]}},
                {{"page":3,"tables":[{LEDGER_HEADER},["1","ΔΑΝΕΙΟ","ΤΡΑΠΕΖΑ","0,00","ΕΥΡΩ","0,00","",""]]}}
            ]}}"#
        ),
        "ΔΗΛΩΣΗ\nΕπώνυμο:\nΠαπαδόπουλος\nΌνομα:\nΓιάννης\nΌνομα Πατρός:\nΚωνσταντίνος\nΌνομα\nΕπώνυμο\n",
    );

    // Income in dollars, one deposit in a currency the table does not know
    write_filer(
        &pdf_dir,
        "nikolaou",
        &format!(
            r#"{{"pageTables":[
                {{"page":1,"tables":[["Α/Α","ΠΗΓΗ","ΠΟΣΟ","ΝΟΜΙΣΜΑ"],["1","ΜΙΣΘΟΣ","2.000,00","Δολάριο ΗΠΑ"]]}},
                {{"page":2,"tables":[["Α/Α","ΤΡΑΠΕΖΑ","ΠΟΣΟ","ΝΟΜΙΣΜΑ"],["1","Α","10,00","ΡΕΑΛ ΒΡΑΖΙΛΙΑΣ"],["2","Β","90,00","ΕΥΡΩ"]]}},
                {{"page":4,"tables":[{LEDGER_HEADER}]}}
            ]}}"#
        ),
        "Επώνυμο:\nΝικολάου\nΌνομα:\nΜαρία\nΌνομα Πατρός:\nΓεώργιος\nΣύζυγος\nΌνομα:\nΑνδρέας\nΕπώνυμο:\nΛάμπρου\nΌνομα Πατρός:\nΔημήτριος\n",
    );

    // Listed, but the table extractor produced nothing
    std::fs::write(pdf_dir.join("broken.pdf"), b"").unwrap();
    std::fs::write(pdf_dir.join("broken.p1.txt"), "Επώνυμο:\nΧ\n").unwrap();

    let folder = year_dir.display();
    std::fs::write(
        year_dir.join("_all.csv"),
        format!(
            "surname,name,link,folder,pdf,csv\n\
             ΠΑΠΑΔΟΠΟΥΛΟΣ,ΓΙΑΝΝΗΣ,http://example.gr/1.pdf,{folder},papadopoulos.pdf,papadopoulos.csv\n\
             ΧΑΛΑΣΜΕΝΟΣ,ΦΑΚΕΛΟΣ,http://example.gr/2.pdf,{folder},broken.pdf,broken.csv\n\
             ΝΙΚΟΛΑΟΥ,ΜΑΡΙΑ,http://example.gr/3.pdf,{folder},nikolaou.pdf,nikolaou.csv\n"
        ),
    )
    .unwrap();

    BatchConfig {
        year: 2019,
        folder: root.to_path_buf(),
        timeout: Duration::from_secs(30),
        write_dumps: true,
        max_stalled: 4,
    }
}

#[tokio::test]
async fn test_extract_year_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());

    let report = run_batch(
        &config,
        Arc::new(JsonTableSource::default()),
        Arc::new(SidecarTextLayer),
    )
    .await
    .unwrap();

    // Totals: the broken filer is counted as skipped and contributes nothing
    assert_eq!(report.totals.processed, 2);
    assert_eq!(report.totals.skipped, 1);
    assert_eq!(report.totals.partial, 1);
    // 2000 USD at the 2018 reference rate 0.8325
    assert!((report.totals.income - (1000.0 + 1665.0)).abs() < 1e-6);
    assert!((report.totals.deposits - 590.0).abs() < 1e-9);
    assert_eq!(report.totals.loan_principal, 0.0);

    let mut reader = csv::Reader::from_path(dir.path().join("2019").join("_sum.csv")).unwrap();
    let rows: Vec<SummaryRow> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.surname, "ΠΑΠΑΔΟΠΟΥΛΟΣ");
    assert_eq!(first.given_name, "ΓΙΑΝΝΗΣ");
    assert_eq!(first.fathers_name, "ΚΩΝΣΤΑΝΤΙΝΟΣ");
    assert_eq!(first.spouse_given_name, "");
    assert_eq!(first.income, "1,000.00 €");
    assert_eq!(first.deposits, "500.00 €");
    assert_eq!(first.accounts, 1);
    assert_eq!(first.loans_principal, "0.00 €");
    assert_eq!(first.loans_due, "0.00 €");
    assert_eq!(first.link, "http://example.gr/1.pdf");
    assert_eq!(first.notes, "");

    let second = &rows[1];
    assert_eq!(second.surname, "ΝΙΚΟΛΑΟΥ");
    assert_eq!(second.spouse_given_name, "ΑΝΔΡΕΑΣ");
    assert_eq!(second.spouse_surname, "ΛΑΜΠΡΟΥ");
    assert_eq!(second.spouse_fathers_name, "ΔΗΜΗΤΡΙΟΣ");
    assert_eq!(second.income, "1,665.00 €");
    assert_eq!(second.deposits, "90.00 €");
    assert_eq!(second.accounts, 2);
    assert!(second.notes.contains("ΡΕΑΛ ΒΡΑΖΙΛΙΑΣ"));

    let dump = std::fs::read_to_string(dir.path().join("2019").join("txt").join("papadopoulos.csv")).unwrap();
    assert!(dump.starts_with("\"Α / Α\",\"ΠΗΓΗ\",\"ΠΟΣΟ\",\"ΝΟΜΙΣΜΑ\"\n"));
    assert!(!dir.path().join("2019").join("txt").join("broken.csv").exists());
}

#[tokio::test]
async fn test_missing_index_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = BatchConfig {
        year: 2017,
        folder: dir.path().to_path_buf(),
        ..BatchConfig::default()
    };

    let result = run_batch(
        &config,
        Arc::new(JsonTableSource::default()),
        Arc::new(SidecarTextLayer),
    )
    .await;

    assert!(result.is_err());
    assert!(!dir.path().join("2017").join("_sum.csv").exists());
}
