//! Report builder: JSONL audit log in, CSV report out.
//!
//! A pure, re-runnable streaming reduction. Script-flow records are skipped;
//! every payload-flow record becomes one row combining the original input
//! columns with the derived outcome columns. Rebuilding from an unmodified
//! log yields byte-identical output, so the report can be regenerated at any
//! time (and filtered down to FAILED rows for a retry run).

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::audit::{AuditRecord, Flow, MigrationStatus, OutcomeSummary};
use crate::error::ReportError;

/// Derived columns appended after the original input columns, in order.
pub const DERIVED_COLUMNS: [&str; 5] =
    ["Status", "Operation", "Error", "RemotePublicId", "RemoteIntegrityTag"];

/// What the build pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    /// Rows written, excluding the header.
    pub rows: u64,
}

/// Streaming audit-log-to-CSV reducer.
pub struct ReportBuilder {
    log_path: PathBuf,
    report_path: PathBuf,
}

impl ReportBuilder {
    pub fn new(log_path: impl Into<PathBuf>, report_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            report_path: report_path.into(),
        }
    }

    /// Run the reduction. The report file is created (or truncated) fresh.
    ///
    /// Report generation assumes a well-formed log: a line that does not
    /// parse as an audit record is fatal for this step, with its line number
    /// in the error. The completed migration run is unaffected.
    pub async fn build(&self) -> Result<ReportSummary, ReportError> {
        let log = File::open(&self.log_path)
            .await
            .map_err(|source| ReportError::OpenLog {
                path: self.log_path.clone(),
                source,
            })?;
        let mut lines = BufReader::new(log).lines();

        let out = File::create(&self.report_path)
            .await
            .map_err(|source| ReportError::CreateReport {
                path: self.report_path.clone(),
                source,
            })?;
        let mut writer = csv_async::AsyncWriterBuilder::new().create_writer(out);

        // Input columns are fixed from the first payload-flow record; all
        // rows of one run share the same input header set.
        let mut input_columns: Option<Vec<String>> = None;
        let mut line_no = 0usize;
        let mut rows = 0u64;

        while let Some(line) = lines.next_line().await.map_err(ReportError::ReadLog)? {
            line_no += 1;
            let record: AuditRecord = serde_json::from_str(&line)
                .map_err(|source| ReportError::MalformedLine { line_no, source })?;
            if record.flow != Flow::Payload {
                continue;
            }

            let input = record.input.clone().unwrap_or_default();
            if input_columns.is_none() {
                let cols: Vec<String> = input.columns().map(str::to_string).collect();
                let header: Vec<&str> = cols
                    .iter()
                    .map(String::as_str)
                    .chain(DERIVED_COLUMNS)
                    .collect();
                writer.write_record(&header).await?;
                input_columns = Some(cols);
            }
            let cols = input_columns.as_deref().unwrap_or_default();

            let mut row: Vec<String> = cols
                .iter()
                .map(|c| input.get(c).unwrap_or_default().to_string())
                .collect();
            row.extend(outcome_cells(&record));
            writer.write_record(&row).await?;
            rows += 1;
        }

        writer.flush().await.map_err(ReportError::FlushReport)?;
        tracing::info!(rows, report = %self.report_path.display(), "report produced");
        Ok(ReportSummary { rows })
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}

/// Derived cells `[Status, Operation, Error, RemotePublicId,
/// RemoteIntegrityTag]` for one payload-flow record.
fn outcome_cells(record: &AuditRecord) -> [String; 5] {
    let Some(summary) = &record.summary else {
        return Default::default();
    };
    match summary.status {
        MigrationStatus::Migrated => {
            let response = record.response.as_ref();
            let overwritten = response
                .and_then(|r| r.get("overwritten"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let operation = if overwritten { "Overwritten" } else { "Uploaded" };
            [
                "MIGRATED".to_string(),
                operation.to_string(),
                String::new(),
                response_cell(response, "public_id"),
                response_cell(response, "etag"),
            ]
        }
        MigrationStatus::Failed => [
            "FAILED".to_string(),
            String::new(),
            error_cell(summary),
            String::new(),
            String::new(),
        ],
    }
}

fn response_cell(response: Option<&Value>, key: &str) -> String {
    match response.and_then(|r| r.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Prefer the human-readable message; fall back to the raw error record.
fn error_cell(summary: &OutcomeSummary) -> String {
    match &summary.err {
        Some(err) if !err.message.is_empty() => err.message.clone(),
        Some(err) => serde_json::to_string(err).unwrap_or_default(),
        None => String::new(),
    }
}
