// 🚚 Batch driver
//
// One run = one disclosure year. Filers are processed one at a time, each
// under a deadline; a filer whose extraction fails or times out is logged and
// left out of the summary and the totals.

use crate::collaborators::{TableSource, TextLayer};
use crate::dump::write_dump;
use crate::error::DisclosureError;
use crate::identity::{extract_identity, tokenize};
use crate::index::{load_index, IndexEntry};
use crate::profile::FormProfile;
use crate::sections::{ExtractionContext, SectionSubtotals};
use crate::summary::{write_summary, BatchTotals, PersonSummary};
use crate::table::PageTable;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub year: i32,
    /// Root of the per-year folders
    pub folder: PathBuf,
    /// Per-filer extraction deadline
    pub timeout: Duration,
    /// Write the per-filer table dump
    pub write_dumps: bool,
    /// Timed-out extractions allowed to linger before the run gives up
    pub max_stalled: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            year: 2019,
            folder: PathBuf::from("./pothenesxes"),
            timeout: Duration::from_secs(120),
            write_dumps: true,
            max_stalled: 4,
        }
    }
}

impl BatchConfig {
    pub fn year_dir(&self) -> PathBuf {
        self.folder.join(self.year.to_string())
    }

    pub fn index_path(&self) -> PathBuf {
        self.year_dir().join("_all.csv")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.year_dir().join("_sum.csv")
    }
}

// ============================================================================
// ONE FILER
// ============================================================================

/// Interpreted document plus the tables it was read from
#[derive(Debug, Clone)]
pub struct Processed {
    pub summary: PersonSummary,
    pub tables: Vec<PageTable>,
}

/// Identity from page 1, then section subtotals from the tables
pub fn process_document(
    pdf: &Path,
    link: &str,
    tables: &dyn TableSource,
    text: &dyn TextLayer,
    profile: &FormProfile,
    disclosure_year: i32,
) -> std::result::Result<Processed, DisclosureError> {
    let fragments = text
        .page_text(pdf, 1)
        .map_err(|e| DisclosureError::extraction(pdf, format!("{:#}", e)))?;
    let identity = extract_identity(&tokenize(&fragments), &profile.identity);

    let page_tables = tables
        .page_tables(pdf)
        .map_err(|e| DisclosureError::extraction(pdf, format!("{:#}", e)))?;
    debug!("{}: {} tables via {}", pdf.display(), page_tables.len(), tables.name());

    let ctx = ExtractionContext::new(disclosure_year, profile);
    let sections = SectionSubtotals::extract(&page_tables, &ctx);

    Ok(Processed {
        summary: PersonSummary::assemble(identity, sections, link.to_string()),
        tables: page_tables,
    })
}

type Extraction = JoinHandle<std::result::Result<Processed, DisclosureError>>;

/// Extractions abandoned after their deadline whose threads are still busy
#[derive(Default)]
pub struct StalledExtractions {
    handles: Vec<Extraction>,
}

impl StalledExtractions {
    /// Forget finished threads, return how many are still running
    pub fn prune(&mut self) -> usize {
        self.handles.retain(|h| !h.is_finished());
        self.handles.len()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// [`process_document`] on a blocking thread, bounded by `timeout`
///
/// A blocking thread cannot be cancelled. A timed-out extraction is moved to
/// `stalled`; it runs on in the background and its result is dropped.
pub async fn process_with_timeout(
    entry: &IndexEntry,
    tables: Arc<dyn TableSource>,
    text: Arc<dyn TextLayer>,
    profile: FormProfile,
    disclosure_year: i32,
    timeout: Duration,
    stalled: &mut StalledExtractions,
) -> std::result::Result<Processed, DisclosureError> {
    let pdf = entry.pdf_path();
    let link = entry.link.clone();
    let task_pdf = pdf.clone();

    let mut task: Extraction = tokio::task::spawn_blocking(move || {
        process_document(
            &task_pdf,
            &link,
            tables.as_ref(),
            text.as_ref(),
            &profile,
            disclosure_year,
        )
    });

    let outcome = tokio::time::timeout(timeout, &mut task).await;
    match outcome {
        Err(_) => {
            stalled.handles.push(task);
            Err(DisclosureError::Timeout {
                path: pdf,
                seconds: timeout.as_secs(),
            })
        }
        Ok(Err(join_error)) => Err(DisclosureError::extraction(pdf, join_error)),
        Ok(Ok(result)) => result,
    }
}

// ============================================================================
// WHOLE RUN
// ============================================================================

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summaries: Vec<PersonSummary>,
    pub totals: BatchTotals,
    pub summary_path: PathBuf,
}

/// Process every filer in the year's index and write `_sum.csv`
pub async fn run_batch(
    config: &BatchConfig,
    tables: Arc<dyn TableSource>,
    text: Arc<dyn TextLayer>,
) -> Result<BatchReport> {
    let entries = load_index(&config.index_path())?;
    let profile = FormProfile::for_year(config.year);
    info!(
        "📂 {} filers for {} (form revision {}, tables: {}, text: {})",
        entries.len(),
        config.year,
        profile.revision,
        tables.name(),
        text.name()
    );

    let mut summaries = Vec::with_capacity(entries.len());
    let mut totals = BatchTotals::default();
    let mut stalled = StalledExtractions::default();

    for (n, entry) in entries.iter().enumerate() {
        let lingering = stalled.prune();
        if lingering >= config.max_stalled {
            error!(
                "❌ {} skipped: {} timed-out extractions still running",
                entry.display_name(),
                lingering
            );
            totals = totals.skip();
            continue;
        }

        info!("[{}/{}] - Processing {}", n + 1, entries.len(), entry.display_name());

        let outcome = process_with_timeout(
            entry,
            Arc::clone(&tables),
            Arc::clone(&text),
            profile.clone(),
            config.year,
            config.timeout,
            &mut stalled,
        )
        .await;

        match outcome {
            Ok(processed) => {
                if config.write_dumps {
                    write_filer_dump(entry, &processed.tables);
                }
                if processed.summary.is_partial() {
                    warn!("{}: partial record ({})", entry.display_name(), processed.summary.notes());
                }
                totals = totals.absorb(&processed.summary);
                summaries.push(processed.summary);
            }
            Err(e) => {
                error!("❌ {} skipped: {}", entry.display_name(), e);
                totals = totals.skip();
            }
        }
    }

    let summary_path = config.summary_path();
    write_summary(&summary_path, &summaries)
        .with_context(|| format!("Failed to write batch summary for {}", config.year))?;

    info!("✅ Wrote {} ({})", summary_path.display(), totals.report());
    if stalled.prune() > 0 {
        warn!("{} timed-out extractions still running at exit", stalled.len());
    }

    Ok(BatchReport {
        summaries,
        totals,
        summary_path,
    })
}

// ============================================================================
// RUNTIME
// ============================================================================

/// Runtime for one batch run
pub fn batch_runtime() -> std::io::Result<Runtime> {
    Builder::new_multi_thread().enable_all().build()
}

/// Shut the runtime down without joining stalled extraction threads
pub fn shutdown_runtime(runtime: Runtime) {
    runtime.shutdown_timeout(Duration::from_millis(200));
}

fn write_filer_dump(entry: &IndexEntry, tables: &[PageTable]) {
    let path = entry.txt_path();
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("Failed to create {}: {}", dir.display(), e);
            return;
        }
    }
    if let Err(e) = write_dump(&path, tables) {
        error!("{}", e);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table;
    use anyhow::bail;

    fn income_and_empty_ledger(amount: &str) -> Vec<PageTable> {
        vec![
            table(1, &[&["Α/Α", "ΠΟΣΟ", "ΝΟΜΙΣΜΑ"], &["1", amount, "ΕΥΡΩ"]]),
            table(2, &[&["Α/Α", "ΕΙΔΟΣ", "ΦΟΡΕΑΣ", "ΑΡΧΙΚΟ", "ΝΟΜΙΣΜΑ", "ΥΠΟΛΟΙΠΟ", "ΑΠΟ", "ΕΩΣ"]]),
        ]
    }

    /// Tables keyed by PDF file name; unknown files fail
    struct FakeTables;

    impl TableSource for FakeTables {
        fn page_tables(&self, pdf: &Path) -> Result<Vec<PageTable>> {
            let name = pdf.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            match name {
                "a.pdf" => Ok(income_and_empty_ledger("1000,00")),
                "c.pdf" => Ok(income_and_empty_ledger("250,50")),
                "slow.pdf" => {
                    std::thread::sleep(Duration::from_millis(500));
                    Ok(Vec::new())
                }
                name if name.starts_with("hung") => {
                    std::thread::sleep(Duration::from_secs(20));
                    Ok(Vec::new())
                }
                _ => bail!("corrupt document {}", name),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct FakeText;

    impl TextLayer for FakeText {
        fn page_text(&self, pdf: &Path, _page: u32) -> Result<Vec<String>> {
            let stem = pdf.file_stem().and_then(|n| n.to_str()).unwrap_or_default();
            Ok(vec![
                "Επώνυμο:".to_string(),
                stem.to_string(),
                "Όνομα:".to_string(),
                "Γιάννης".to_string(),
            ])
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn write_index(dir: &Path, year: i32, files: &[&str]) -> BatchConfig {
        let year_dir = dir.join(year.to_string());
        std::fs::create_dir_all(&year_dir).unwrap();

        let mut index = String::from("surname,name,link,folder,pdf,csv\n");
        for f in files {
            index.push_str(&format!(
                "Χ,Υ,http://example.gr/{f},{},{f},{f}.txt\n",
                year_dir.display()
            ));
        }
        std::fs::write(year_dir.join("_all.csv"), index).unwrap();

        BatchConfig {
            year,
            folder: dir.to_path_buf(),
            timeout: Duration::from_secs(5),
            write_dumps: true,
            max_stalled: 4,
        }
    }

    fn entry(pdf: &str) -> IndexEntry {
        IndexEntry {
            surname: "Χ".to_string(),
            given_name: "Υ".to_string(),
            link: String::new(),
            folder: PathBuf::from("out"),
            pdf_file: pdf.to_string(),
            txt_file: format!("{}.txt", pdf),
            line_number: 2,
        }
    }

    #[tokio::test]
    async fn test_failed_filer_is_skipped_and_excluded_from_totals() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_index(dir.path(), 2019, &["a.pdf", "b.pdf", "c.pdf"]);

        let report = run_batch(&config, Arc::new(FakeTables), Arc::new(FakeText))
            .await
            .unwrap();

        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.totals.processed, 2);
        assert_eq!(report.totals.skipped, 1);
        assert_eq!(report.totals.income, 1250.5);
        assert_eq!(report.totals.partial, 0);
        assert_eq!(report.summaries[0].identity.surname, "A");
        assert_eq!(report.summaries[0].identity.given_name, "ΓΙΑΝΝΗΣ");
        assert_eq!(report.summaries[1].link, "http://example.gr/c.pdf");

        let written = std::fs::read_to_string(&report.summary_path).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(!written.contains("b.pdf"));

        let dump = dir.path().join("2019").join("txt").join("a.pdf.txt");
        assert!(std::fs::read_to_string(dump).unwrap().contains("\"1000,00\""));
    }

    #[tokio::test]
    async fn test_slow_filer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_index(dir.path(), 2019, &["slow.pdf", "a.pdf"]);
        config.timeout = Duration::from_millis(50);

        let report = run_batch(&config, Arc::new(FakeTables), Arc::new(FakeText))
            .await
            .unwrap();

        assert_eq!(report.totals.skipped, 1);
        assert_eq!(report.totals.processed, 1);
        assert_eq!(report.totals.income, 1000.0);
    }

    #[tokio::test]
    async fn test_timeout_error_names_the_document() {
        let mut stalled = StalledExtractions::default();
        let err = process_with_timeout(
            &entry("slow.pdf"),
            Arc::new(FakeTables),
            Arc::new(FakeText),
            FormProfile::for_year(2019),
            2019,
            Duration::from_millis(10),
            &mut stalled,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DisclosureError::Timeout { .. }));
        assert!(err.to_string().contains("slow.pdf"));
        assert_eq!(stalled.len(), 1);
    }

    #[test]
    fn test_shutdown_does_not_wait_for_hung_extraction() {
        let runtime = batch_runtime().unwrap();
        let started = std::time::Instant::now();

        let mut stalled = StalledExtractions::default();
        let result = runtime.block_on(process_with_timeout(
            &entry("hung.pdf"),
            Arc::new(FakeTables),
            Arc::new(FakeText),
            FormProfile::for_year(2019),
            2019,
            Duration::from_millis(50),
            &mut stalled,
        ));
        assert!(matches!(result, Err(DisclosureError::Timeout { .. })));
        assert_eq!(stalled.prune(), 1);

        drop(stalled);
        shutdown_runtime(runtime);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stalled_cap_skips_remaining_filers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_index(dir.path(), 2019, &["hung1.pdf", "hung2.pdf", "a.pdf"]);
        config.timeout = Duration::from_millis(50);
        config.max_stalled = 1;

        let runtime = batch_runtime().unwrap();
        let started = std::time::Instant::now();
        let report = runtime
            .block_on(run_batch(&config, Arc::new(FakeTables), Arc::new(FakeText)))
            .unwrap();
        shutdown_runtime(runtime);

        // hung1 times out; with one extraction lingering the rest are skipped
        assert_eq!(report.totals.processed, 0);
        assert_eq!(report.totals.skipped, 3);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_extraction_failure_is_domain_error() {
        let err = process_document(
            Path::new("out/pdf/b.pdf"),
            "",
            &FakeTables,
            &FakeText,
            &FormProfile::for_year(2019),
            2019,
        )
        .unwrap_err();

        assert!(matches!(err, DisclosureError::Extraction { .. }));
        assert!(err.to_string().contains("corrupt document b.pdf"));
    }

    #[test]
    fn test_missing_index_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig {
            folder: dir.path().to_path_buf(),
            ..BatchConfig::default()
        };

        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(run_batch(&config, Arc::new(FakeTables), Arc::new(FakeText)));
        assert!(result.is_err());
    }
}
