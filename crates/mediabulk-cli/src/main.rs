//! mediabulk - CSV-driven bulk asset migration CLI.
//!
//! Commands:
//! - `migrate`: bulk-upload new assets listed in a CSV file
//! - `update`: bulk-update existing assets via the explicit API
//!
//! Each run streams the input CSV, executes remote calls under a concurrency
//! cap, writes a JSONL audit log, and derives a CSV report from it. The run
//! refuses to start when the output folder already holds a log or report
//! file from an earlier batch.

mod config;
mod confirm;
mod executor;
mod payload;
mod progress;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use mediabulk_core::{
    count_records, record_stream, AuditLogger, AuditRecord, OperationExecutor, OutputFolder,
    PayloadTransform, ReportBuilder, Runner,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::config::ApiConfig;
use crate::executor::{UpdateExecutor, UploadExecutor};
use crate::progress::ProgressBars;

#[derive(Parser)]
#[command(name = "mediabulk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulk-migrate or bulk-update assets in a media-management API", long_about = None)]
struct Cli {
    /// Enable verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload new assets listed in the input CSV
    Migrate(BatchArgs),

    /// Update existing assets listed in the input CSV
    Update(BatchArgs),
}

#[derive(Args)]
struct BatchArgs {
    /// CSV file detailing the assets to process
    #[arg(short = 'f', long)]
    from_csv_file: PathBuf,

    /// Folder for the migration log and report files; the run stops if
    /// either file already exists there
    #[arg(short = 'o', long)]
    output_folder: PathBuf,

    /// Max number of concurrent uploads
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=20))]
    max_concurrent_uploads: u8,

    /// Skip the interactive confirmation prompt
    #[arg(short = 'y', long)]
    assume_yes: bool,
}

enum Operation {
    Migrate,
    Update,
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Migrate => "migrate",
            Self::Update => "update",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Migrate(args) => run_batch(args, Operation::Migrate).await,
        Commands::Update(args) => run_batch(args, Operation::Update).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_batch(args: BatchArgs, operation: Operation) -> Result<()> {
    if !args.from_csv_file.exists() {
        bail!("input file does not exist: {}", args.from_csv_file.display());
    }
    let api = ApiConfig::from_env()?;
    let out = OutputFolder::prepare(&args.output_folder)?;

    let parameters = json!({
        "operation": operation.name(),
        "dest_host": api.base_url,
        "from_csv_file": args.from_csv_file.display().to_string(),
        "output_folder": out.root().display().to_string(),
        "max_concurrent_uploads": args.max_concurrent_uploads,
    });

    if !args.assume_yes {
        let prompt = format!(
            "WARNING: this will perform a bulk {} with the following parameters:\n{}\n\nAre you sure you want to proceed? [y/N]",
            operation.name(),
            serde_json::to_string_pretty(&parameters)?
        );
        if !confirm::confirm(&prompt).await? {
            bail!("parameters not confirmed; terminating");
        }
    }

    let audit = AuditLogger::create(out.log_path()).await?;
    audit
        .append(&AuditRecord::script_with_parameters(
            "parameters confirmed, starting batch routine",
            parameters,
        ))
        .await?;

    let total = count_records(&args.from_csv_file).await?;
    println!("Starting bulk {} of {total} assets", operation.name());

    let transform: Box<PayloadTransform> = match operation {
        Operation::Migrate => Box::new(payload::migrate_payload),
        Operation::Update => Box::new(payload::update_payload),
    };
    let remote: Arc<dyn OperationExecutor> = match operation {
        Operation::Migrate => Arc::new(UploadExecutor::new(api)),
        Operation::Update => Arc::new(UpdateExecutor::new(api)),
    };

    let bars = ProgressBars::new(total);
    let bars_cb = bars.clone();
    let limit =
        NonZeroUsize::new(usize::from(args.max_concurrent_uploads)).unwrap_or(NonZeroUsize::MIN);

    let runner = Runner::new(limit, transform, remote)
        .with_progress(Box::new(move |snapshot| bars_cb.update(snapshot)));

    let records = record_stream(&args.from_csv_file).await?;
    let stats = runner.run(records, &audit).await?;
    bars.finish();

    audit
        .append(&AuditRecord::script_with_stats("routine complete", stats))
        .await?;

    println!("Bulk routine complete. {stats}");
    println!("Log persisted to '{}'", out.log_path().display());

    println!("Producing report from the log file (this may take some time for large batches)");
    let report = ReportBuilder::new(out.log_path(), out.report_path())
        .build()
        .await?;
    println!(
        "Report with {} rows written to '{}'",
        report.rows,
        out.report_path().display()
    );
    Ok(())
}
