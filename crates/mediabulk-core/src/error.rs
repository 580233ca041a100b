//! Error taxonomy for the batch engine.
//!
//! Item-level failures (`ItemError`) are recorded in the audit log and never
//! propagate out of the runner. Everything else is fatal for the step that
//! raised it.

use std::path::PathBuf;

/// Fatal failures of the input record source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot open input file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read CSV headers from {path}: {source}")]
    Headers {
        path: PathBuf,
        #[source]
        source: csv_async::Error,
    },

    #[error("malformed CSV input: {0}")]
    Malformed(#[from] csv_async::Error),
}

/// A failure scoped to a single input record.
///
/// Exactly one of these ends up in the item's audit record; it never aborts
/// the batch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ItemError {
    #[error("payload transform failed: {0}")]
    Transform(String),

    #[error("{kind}: {message}")]
    Execution { kind: String, message: String },
}

impl ItemError {
    /// Build an execution error from any displayable failure.
    pub fn execution(kind: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Execution {
            kind: kind.into(),
            message: err.to_string(),
        }
    }
}

/// Fatal audit log failures. Losing the audit trail silently is never
/// acceptable, so these abort the run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log {path} already exists")]
    AlreadyExists { path: PathBuf },

    #[error("cannot create audit log {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write audit record: {0}")]
    Write(#[from] std::io::Error),

    #[error("cannot serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fatal failures while deriving the report from the audit log.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot open audit log {path}: {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create report file {path}: {source}")]
    CreateReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed audit log line {line_no}: {source}")]
    MalformedLine {
        line_no: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read audit log: {0}")]
    ReadLog(#[source] std::io::Error),

    #[error("cannot write report row: {0}")]
    WriteRow(#[from] csv_async::Error),

    #[error("cannot flush report file: {0}")]
    FlushReport(#[source] std::io::Error),
}

/// Output folder validation failures, raised before any processing starts.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("output file {path} already exists; choose another folder or move the existing files to prevent data loss")]
    AlreadyExists { path: PathBuf },

    #[error("cannot create output folder {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal errors of a whole batch run.
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for batch engine operations.
pub type Result<T, E = BulkError> = std::result::Result<T, E>;
