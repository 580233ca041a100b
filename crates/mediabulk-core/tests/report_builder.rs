//! Report derivation from the audit log: determinism, completeness, and
//! strictness against corrupt logs.

use mediabulk_core::{
    AuditRecord, InputRecord, ItemError, OutcomeSummary, ReportBuilder, ReportError,
};
use serde_json::json;
use std::path::{Path, PathBuf};

fn input(id: &str, url: &str) -> InputRecord {
    InputRecord::from_row(
        &["Id".to_string(), "Url".to_string()],
        &[id.to_string(), url.to_string()],
    )
}

fn migrated(id: &str, overwritten: bool) -> AuditRecord {
    AuditRecord::payload(
        input(id, &format!("https://cdn.example/{id}.jpg")),
        Some(json!({"file": format!("https://cdn.example/{id}.jpg")})),
        Some(json!({
            "public_id": id,
            "etag": format!("etag-{id}"),
            "overwritten": overwritten,
        })),
        OutcomeSummary::migrated(),
    )
}

fn failed(id: &str, message: &str) -> AuditRecord {
    AuditRecord::payload(
        input(id, &format!("https://cdn.example/{id}.jpg")),
        Some(json!({"file": format!("https://cdn.example/{id}.jpg")})),
        None,
        OutcomeSummary::failed(&ItemError::execution("http_status", message)),
    )
}

async fn write_log(dir: &Path, entries: &[AuditRecord]) -> PathBuf {
    let path = dir.join("log.jsonl");
    let mut lines = String::new();
    for entry in entries {
        lines.push_str(&serde_json::to_string(entry).unwrap());
        lines.push('\n');
    }
    tokio::fs::write(&path, lines).await.unwrap();
    path
}

fn mixed_entries() -> Vec<AuditRecord> {
    vec![
        AuditRecord::script("migration parameters confirmed"),
        migrated("a1", false),
        failed("a2", "404 Not Found"),
        migrated("a3", true),
        AuditRecord::script("routine complete"),
    ]
}

#[tokio::test]
async fn report_contains_one_row_per_payload_entry() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), &mixed_entries()).await;
    let report = dir.path().join("report.csv");

    let summary = ReportBuilder::new(&log, &report).build().await.unwrap();
    assert_eq!(summary.rows, 3);

    let content = tokio::fs::read_to_string(&report).await.unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4); // header + 3 rows
    assert_eq!(
        lines[0],
        "Id,Url,Status,Operation,Error,RemotePublicId,RemoteIntegrityTag"
    );
}

#[tokio::test]
async fn success_and_failure_rows_carry_the_right_cells() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), &mixed_entries()).await;
    let report = dir.path().join("report.csv");
    ReportBuilder::new(&log, &report).build().await.unwrap();

    let content = tokio::fs::read_to_string(&report).await.unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(
        lines[1],
        "a1,https://cdn.example/a1.jpg,MIGRATED,Uploaded,,a1,etag-a1"
    );
    assert_eq!(
        lines[2],
        "a2,https://cdn.example/a2.jpg,FAILED,,404 Not Found,,"
    );
    assert_eq!(
        lines[3],
        "a3,https://cdn.example/a3.jpg,MIGRATED,Overwritten,,a3,etag-a3"
    );
}

#[tokio::test]
async fn rebuilding_from_the_same_log_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), &mixed_entries()).await;

    let first = dir.path().join("report-1.csv");
    let second = dir.path().join("report-2.csv");
    ReportBuilder::new(&log, &first).build().await.unwrap();
    ReportBuilder::new(&log, &second).build().await.unwrap();

    let a = tokio::fs::read(&first).await.unwrap();
    let b = tokio::fs::read(&second).await.unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[tokio::test]
async fn malformed_log_line_is_fatal_with_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log.jsonl");
    let good = serde_json::to_string(&migrated("a1", false)).unwrap();
    tokio::fs::write(&log, format!("{good}\nnot json at all\n"))
        .await
        .unwrap();

    let err = ReportBuilder::new(&log, dir.path().join("report.csv"))
        .build()
        .await
        .err()
        .unwrap();
    match err {
        ReportError::MalformedLine { line_no, .. } => assert_eq!(line_no, 2),
        other => panic!("expected MalformedLine, got {other}"),
    }
}

#[tokio::test]
async fn script_only_log_produces_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(
        dir.path(),
        &[
            AuditRecord::script("migration parameters confirmed"),
            AuditRecord::script("routine complete"),
        ],
    )
    .await;
    let report = dir.path().join("report.csv");

    let summary = ReportBuilder::new(&log, &report).build().await.unwrap();
    assert_eq!(summary.rows, 0);

    let content = tokio::fs::read_to_string(&report).await.unwrap();
    assert!(content.is_empty());
}

#[tokio::test]
async fn missing_log_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReportBuilder::new(dir.path().join("absent.jsonl"), dir.path().join("r.csv"))
        .build()
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ReportError::OpenLog { .. }));
}
