//! mediabulk core engine.
//!
//! Streams an input CSV, fans each record out through a payload transform and
//! an asynchronous operation executor under a concurrency cap, keeps atomic
//! aggregate stats, appends one JSONL audit record per item, and later reduces
//! the audit log into a CSV report.

pub mod audit;
pub mod error;
pub mod fakes;
pub mod output;
pub mod record;
pub mod report;
pub mod runner;
pub mod source;
pub mod stats;

pub use audit::{AuditLogger, AuditRecord, ErrorInfo, Flow, MigrationStatus, OutcomeSummary};
pub use error::{
    AuditError, BulkError, ItemError, OutputError, ReportError, Result, SourceError,
};
pub use output::{OutputFolder, LOG_FILE_NAME, REPORT_FILE_NAME};
pub use record::InputRecord;
pub use report::{ReportBuilder, ReportSummary, DERIVED_COLUMNS};
pub use runner::{OperationExecutor, PayloadTransform, ProgressFn, Runner};
pub use source::{count_records, record_stream};
pub use stats::{StatsHandle, StatsSnapshot};
