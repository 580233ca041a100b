//! Concurrency-bounded batch runner.
//!
//! Drives the record source through the payload transform and the operation
//! executor while keeping at most N executions in flight. Submission follows
//! source order; completion order is whatever the network gives us. Each
//! admitted record produces exactly one payload-flow audit record, whether it
//! succeeded, failed in the executor, or never reached the executor because
//! the transform rejected it.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::audit::{AuditLogger, AuditRecord, OutcomeSummary};
use crate::error::{BulkError, ItemError, SourceError};
use crate::record::InputRecord;
use crate::stats::{StatsHandle, StatsSnapshot};

/// Pure, synchronous mapping from an input record to the remote call
/// parameters. May fail per record; the failure is item-level.
pub type PayloadTransform = dyn Fn(&InputRecord) -> Result<Value, ItemError> + Send + Sync;

/// Progress callback invoked after each item completion with fresh counters.
pub type ProgressFn = dyn Fn(StatsSnapshot) + Send + Sync;

/// Asynchronous remote operation: payload in, response data or failure out.
///
/// How the payload travels (plain call, chunked upload, retry logic) is the
/// implementor's concern; the runner only sees one result per invocation.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(&self, payload: &Value) -> Result<Value, ItemError>;
}

/// The batch engine for one run.
pub struct Runner {
    concurrency: NonZeroUsize,
    transform: Box<PayloadTransform>,
    executor: Arc<dyn OperationExecutor>,
    stats: StatsHandle,
    on_progress: Option<Box<ProgressFn>>,
}

impl Runner {
    pub fn new(
        concurrency: NonZeroUsize,
        transform: Box<PayloadTransform>,
        executor: Arc<dyn OperationExecutor>,
    ) -> Self {
        Self {
            concurrency,
            transform,
            executor,
            stats: StatsHandle::new(),
            on_progress: None,
        }
    }

    /// Attach a progress callback; it runs after every item completion.
    pub fn with_progress(mut self, on_progress: Box<ProgressFn>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Handle to the live counters, for observers outside the run loop.
    pub fn stats(&self) -> StatsHandle {
        self.stats.clone()
    }

    /// Consume the record stream to completion and return the final counters.
    ///
    /// Item-level failures are recorded and counted, never propagated. A
    /// [`SourceError`] or an audit write failure aborts the run; executions
    /// still in flight at that point are dropped.
    pub async fn run<S>(&self, records: S, audit: &AuditLogger) -> Result<StatsSnapshot, BulkError>
    where
        S: Stream<Item = Result<InputRecord, SourceError>>,
    {
        tracing::info!(concurrency = self.concurrency.get(), "batch routine started");

        let mut completions = Box::pin(records)
            .map(|next| async move {
                let record = next?;
                self.process_one(record, audit).await
            })
            .buffer_unordered(self.concurrency.get());

        while let Some(done) = completions.next().await {
            done?;
        }

        let finished = self.stats.snapshot();
        tracing::info!(
            attempted = finished.attempted,
            succeeded = finished.succeeded,
            failed = finished.failed,
            "batch routine complete"
        );
        Ok(finished)
    }

    /// Process one record end to end. Only audit write failures escape.
    async fn process_one(&self, input: InputRecord, audit: &AuditLogger) -> Result<(), BulkError> {
        self.stats.begin_attempt();

        let (payload, outcome) = match (self.transform)(&input) {
            Ok(payload) => {
                let result = self.executor.execute(&payload).await;
                (Some(payload), result)
            }
            // Transform rejected the record; the executor never runs.
            Err(err) => (None, Err(err)),
        };

        let (response, summary) = match outcome {
            Ok(response) => {
                self.stats.record_success();
                (Some(response), OutcomeSummary::migrated())
            }
            Err(err) => {
                self.stats.record_failure();
                tracing::debug!(error = %err, "item failed");
                (None, OutcomeSummary::failed(&err))
            }
        };

        let logged = audit
            .append(&AuditRecord::payload(input, payload, response, summary))
            .await;

        if let Some(on_progress) = &self.on_progress {
            on_progress(self.stats.snapshot());
        }
        self.stats.end_attempt();

        logged.map_err(BulkError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Flow, MigrationStatus};
    use futures::stream;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    struct EchoExecutor;

    #[async_trait]
    impl OperationExecutor for EchoExecutor {
        async fn execute(&self, payload: &Value) -> Result<Value, ItemError> {
            Ok(payload.clone())
        }
    }

    fn record(id: &str) -> InputRecord {
        InputRecord::from_row(&["Id".to_string()], &[id.to_string()])
    }

    #[tokio::test]
    async fn transform_failure_still_produces_one_audit_record() {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLogger::create(dir.path().join("log.jsonl")).await.unwrap();

        let runner = Runner::new(
            limit(2),
            Box::new(|_rec| Err(ItemError::Transform("no Url column".to_string()))),
            Arc::new(EchoExecutor),
        );

        let stats = runner
            .run(stream::iter(vec![Ok(record("a1"))]), &audit)
            .await
            .unwrap();
        assert_eq!(stats.attempted, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.concurrent, 0);

        let content = tokio::fs::read_to_string(audit.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let rec: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(rec.flow, Flow::Payload);
        assert!(rec.payload.is_none());
        assert!(rec.response.is_none());
        assert_eq!(rec.summary.unwrap().status, MigrationStatus::Failed);
    }

    #[tokio::test]
    async fn source_error_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLogger::create(dir.path().join("log.jsonl")).await.unwrap();

        let runner = Runner::new(
            limit(2),
            Box::new(|rec| Ok(serde_json::json!({"id": rec.get("Id")}))),
            Arc::new(EchoExecutor),
        );

        let broken = csv_error_stream();
        let err = runner.run(broken, &audit).await.err().unwrap();
        assert!(matches!(err, BulkError::Source(_)));
    }

    fn csv_error_stream() -> impl Stream<Item = Result<InputRecord, SourceError>> {
        stream::iter(vec![
            Ok(record("a1")),
            Err(SourceError::Open {
                path: "gone.csv".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            }),
        ])
    }
}
