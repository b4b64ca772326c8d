use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pothen_esxes::{
    batch_runtime, process_document, run_batch, shutdown_runtime, BatchConfig, FormProfile,
    JsonTableSource, SidecarTextLayer, TextLayer,
};

#[derive(Parser)]
#[command(version, about = "Summarize Greek asset-disclosure (pothen esxes) forms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every filer listed in <folder>/<year>/_all.csv
    Extract {
        /// Disclosure year
        #[arg(short, long)]
        year: i32,

        #[arg(short, long, default_value = "./pothenesxes")]
        folder: PathBuf,

        /// Per-filer extraction deadline
        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,

        /// Extension of the table extractor output next to each PDF
        #[arg(long, default_value = "json")]
        tables_ext: String,

        #[arg(long, value_enum, default_value_t = TextSource::default())]
        text: TextSource,

        /// Skip the per-filer table dumps under txt/
        #[arg(long)]
        no_dumps: bool,

        /// Timed-out extractions allowed to keep running before the rest of the run is skipped
        #[arg(long, default_value_t = 4)]
        max_stalled: usize,
    },

    /// Interpret a single document and print the record as JSON
    Inspect {
        pdf: PathBuf,

        #[arg(short, long)]
        year: i32,

        #[arg(long, default_value = "json")]
        tables_ext: String,

        #[arg(long, value_enum, default_value_t = TextSource::default())]
        text: TextSource,
    },
}

#[derive(Copy, Clone, Default, PartialEq, Eq, ValueEnum, Debug)]
enum TextSource {
    /// Read the text layer from the PDF itself
    #[cfg_attr(feature = "pdf", default)]
    Pdf,
    /// Pre-extracted `<name>.p<page>.txt` files
    #[cfg_attr(not(feature = "pdf"), default)]
    Sidecar,
}

fn text_layer(source: TextSource) -> Result<Arc<dyn TextLayer>> {
    match source {
        #[cfg(feature = "pdf")]
        TextSource::Pdf => Ok(Arc::new(pothen_esxes::LopdfTextLayer)),
        #[cfg(not(feature = "pdf"))]
        TextSource::Pdf => bail!("built without the `pdf` feature; use --text sidecar"),
        TextSource::Sidecar => Ok(Arc::new(SidecarTextLayer)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Built by hand so shutdown does not join extractions that timed out
    let runtime = batch_runtime()?;
    let result = runtime.block_on(run(cli));
    shutdown_runtime(runtime);
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract {
            year,
            folder,
            timeout_secs,
            tables_ext,
            text,
            no_dumps,
            max_stalled,
        } => {
            let config = BatchConfig {
                year,
                folder,
                timeout: Duration::from_secs(timeout_secs),
                write_dumps: !no_dumps,
                max_stalled,
            };
            info!("🗂️  pothen-esxes {} - year {}", pothen_esxes::VERSION, config.year);

            let report = run_batch(
                &config,
                Arc::new(JsonTableSource::new(tables_ext)),
                text_layer(text)?,
            )
            .await?;

            if report.totals.processed == 0 && report.totals.skipped > 0 {
                bail!("every filer failed ({} skipped)", report.totals.skipped);
            }
            Ok(())
        }

        Command::Inspect {
            pdf,
            year,
            tables_ext,
            text,
        } => {
            let profile = FormProfile::for_year(year);
            let tables = JsonTableSource::new(tables_ext);
            let layer = text_layer(text)?;

            let processed = process_document(&pdf, "", &tables, layer.as_ref(), &profile, year)?;
            println!("{}", serde_json::to_string_pretty(&processed.summary)?);
            Ok(())
        }
    }
}
