//! Durable, append-only JSONL audit log.
//!
//! Every completed item produces exactly one `payload`-flow record; process
//! lifecycle events (parameters confirmed, routine complete) go to the
//! `script` flow so the report builder can filter them out later. The logger
//! is an explicit instance passed into the runner, not a process-wide
//! singleton, so tests stay isolated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::error::{AuditError, ItemError};
use crate::record::InputRecord;
use crate::stats::StatsSnapshot;

/// Log-entry category: process lifecycle vs per-item outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Script,
    Payload,
}

/// Final status of one migration operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationStatus {
    #[serde(rename = "MIGRATED")]
    Migrated,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Structured error representation written to the log.
///
/// Built at the logger boundary from an [`ItemError`] so a failure never
/// serializes to an empty object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&ItemError> for ErrorInfo {
    fn from(err: &ItemError) -> Self {
        match err {
            ItemError::Transform(message) => Self {
                kind: "transform".to_string(),
                message: message.clone(),
            },
            ItemError::Execution { kind, message } => Self {
                kind: kind.clone(),
                message: message.clone(),
            },
        }
    }
}

/// Outcome summary of one item: status plus the error when it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub status: MigrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorInfo>,
}

impl OutcomeSummary {
    pub fn migrated() -> Self {
        Self {
            status: MigrationStatus::Migrated,
            err: None,
        }
    }

    pub fn failed(err: &ItemError) -> Self {
        Self {
            status: MigrationStatus::Failed,
            err: Some(ErrorInfo::from(err)),
        }
    }
}

/// One line of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub flow: Flow,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<OutcomeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsSnapshot>,
}

impl AuditRecord {
    fn script_base(msg: impl Into<String>) -> Self {
        Self {
            flow: Flow::Script,
            time: Utc::now(),
            msg: Some(msg.into()),
            parameters: None,
            input: None,
            payload: None,
            response: None,
            summary: None,
            stats: None,
        }
    }

    /// Plain lifecycle event.
    pub fn script(msg: impl Into<String>) -> Self {
        Self::script_base(msg)
    }

    /// Lifecycle event carrying the confirmed run parameters.
    pub fn script_with_parameters(msg: impl Into<String>, parameters: Value) -> Self {
        Self {
            parameters: Some(parameters),
            ..Self::script_base(msg)
        }
    }

    /// Lifecycle event carrying the final aggregate stats.
    pub fn script_with_stats(msg: impl Into<String>, stats: StatsSnapshot) -> Self {
        Self {
            stats: Some(stats),
            ..Self::script_base(msg)
        }
    }

    /// Per-item outcome record. `payload` and `response` stay `None` when the
    /// corresponding step never ran (e.g. the transform failed).
    pub fn payload(
        input: InputRecord,
        payload: Option<Value>,
        response: Option<Value>,
        summary: OutcomeSummary,
    ) -> Self {
        Self {
            flow: Flow::Payload,
            time: Utc::now(),
            msg: None,
            parameters: None,
            input: Some(input),
            payload,
            response,
            summary: Some(summary),
            stats: None,
        }
    }
}

/// Single-writer, append-only audit log bound to one run.
pub struct AuditLogger {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl AuditLogger {
    /// Create the log file. Refuses to touch a pre-existing file: a leftover
    /// log from a previous run must never be silently appended to or
    /// truncated.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| {
                if source.kind() == ErrorKind::AlreadyExists {
                    AuditError::AlreadyExists { path: path.clone() }
                } else {
                    AuditError::Create {
                        path: path.clone(),
                        source,
                    }
                }
            })?;

        tracing::debug!(path = %path.display(), "audit log created");

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Append one record as a single JSON line and flush it to disk.
    ///
    /// A write failure is fatal for the run; the audit trail must stay
    /// complete.
    pub async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_errors_serialize_with_kind_and_message() {
        let err = ItemError::execution("http_status", "404 Not Found");
        let info = ErrorInfo::from(&err);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["kind"], "http_status");
        assert_eq!(json["message"], "404 Not Found");

        let transform = ItemError::Transform("missing Url column".to_string());
        let info = ErrorInfo::from(&transform);
        assert_eq!(info.kind, "transform");
        assert_eq!(info.message, "missing Url column");
    }

    #[test]
    fn status_uses_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&MigrationStatus::Migrated).unwrap(),
            "\"MIGRATED\""
        );
        assert_eq!(
            serde_json::to_string(&MigrationStatus::Failed).unwrap(),
            "\"FAILED\""
        );
    }

    #[tokio::test]
    async fn create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        tokio::fs::write(&path, "leftover\n").await.unwrap();

        let err = AuditLogger::create(&path).await.err().unwrap();
        assert!(matches!(err, AuditError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn append_writes_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let logger = AuditLogger::create(&path).await.unwrap();

        logger
            .append(&AuditRecord::script("routine started"))
            .await
            .unwrap();
        let input = InputRecord::from_row(&["Id".to_string()], &["a1".to_string()]);
        logger
            .append(&AuditRecord::payload(
                input,
                Some(serde_json::json!({"file": "u"})),
                None,
                OutcomeSummary::failed(&ItemError::Transform("boom".to_string())),
            ))
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.flow, Flow::Script);

        let second: AuditRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.flow, Flow::Payload);
        let summary = second.summary.unwrap();
        assert_eq!(summary.status, MigrationStatus::Failed);
        assert_eq!(summary.err.unwrap().message, "boom");
    }
}
