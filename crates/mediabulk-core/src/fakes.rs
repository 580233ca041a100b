//! In-memory executors for tests: no network, deterministic outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ItemError;
use crate::runner::OperationExecutor;

/// Executor that always succeeds with a fixed response.
#[derive(Debug, Clone)]
pub struct StaticExecutor {
    response: Value,
}

impl StaticExecutor {
    pub fn new(response: Value) -> Self {
        Self { response }
    }

    /// A plausible upload response with the fields the report reads.
    pub fn uploaded(public_id: &str) -> Self {
        Self::new(serde_json::json!({
            "public_id": public_id,
            "etag": format!("etag-{public_id}"),
            "overwritten": false,
        }))
    }
}

#[async_trait]
impl OperationExecutor for StaticExecutor {
    async fn execute(&self, _payload: &Value) -> Result<Value, ItemError> {
        Ok(self.response.clone())
    }
}

/// Executor that always fails with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingExecutor {
    kind: String,
    message: String,
}

impl FailingExecutor {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl OperationExecutor for FailingExecutor {
    async fn execute(&self, _payload: &Value) -> Result<Value, ItemError> {
        Err(ItemError::Execution {
            kind: self.kind.clone(),
            message: self.message.clone(),
        })
    }
}

/// Executor backed by a plain closure, for per-test behavior.
pub struct FnExecutor<F>(pub F);

#[async_trait]
impl<F> OperationExecutor for FnExecutor<F>
where
    F: Fn(&Value) -> Result<Value, ItemError> + Send + Sync,
{
    async fn execute(&self, payload: &Value) -> Result<Value, ItemError> {
        (self.0)(payload)
    }
}

/// Wrapper that records the in-flight high-water mark of an inner executor.
///
/// Each call holds its slot for `delay` before delegating, giving the runner
/// a realistic window in which concurrent calls overlap.
pub struct TrackingExecutor {
    inner: Arc<dyn OperationExecutor>,
    delay: Duration,
    current: AtomicUsize,
    max: AtomicUsize,
}

impl TrackingExecutor {
    pub fn new(inner: Arc<dyn OperationExecutor>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            current: AtomicUsize::new(0),
            max: AtomicUsize::new(0),
        }
    }

    /// Highest number of simultaneously running `execute` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperationExecutor for TrackingExecutor {
    async fn execute(&self, payload: &Value) -> Result<Value, ItemError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let result = self.inner.execute(payload).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
