//! Mock call provider for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::provider::{CallProvider, CallStarted, ProviderError};

/// Mock implementation of the CallProvider trait.
///
/// Provides controllable behavior for testing:
/// - Configurable call-start payload (and therefore execution id)
/// - Scripted sequence of execution statuses, with a fallback status
///   once the script runs out
/// - Injected failures for start, status and log requests
/// - Recorded recipients and status fetch counts for assertions
///
/// # Example
///
/// ```rust,ignore
/// use ringback_core::testing::MockCallProvider;
///
/// let provider = MockCallProvider::new();
/// provider.set_start_payload(json!({ "execution_id": "abc" })).await;
/// provider.push_status("in-progress", None).await;
/// provider.push_status("completed", Some("hello")).await;
///
/// // ... run the poller ...
/// assert_eq!(provider.status_fetch_count(), 2);
/// ```
pub struct MockCallProvider {
    /// Payload returned by `start_call`.
    start_payload: RwLock<Value>,
    /// If set, the next `start_call` fails with this error.
    next_start_error: RwLock<Option<ProviderError>>,
    /// Artificial latency for `start_call`.
    start_delay: RwLock<Option<Duration>>,
    /// Scripted responses for `execution`, consumed front to back.
    scripted: RwLock<VecDeque<Result<Value, ProviderError>>>,
    /// Response once the script is exhausted.
    fallback: RwLock<Result<Value, ProviderError>>,
    /// Payload returned by `execution_log`.
    log_payload: RwLock<Result<Value, ProviderError>>,
    /// Recipients passed to `start_call`.
    recipients: RwLock<Vec<String>>,
    /// Execution ids passed to `execution`.
    fetched_ids: RwLock<Vec<String>>,
    status_fetches: AtomicUsize,
}

impl std::fmt::Debug for MockCallProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCallProvider")
            .field("status_fetches", &self.status_fetch_count())
            .finish_non_exhaustive()
    }
}

impl Default for MockCallProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCallProvider {
    /// Create a mock that starts executions with id `mock-exec-1` and
    /// reports `queued` forever.
    pub fn new() -> Self {
        Self {
            start_payload: RwLock::new(json!({
                "message": "done",
                "status": "queued",
                "execution_id": "mock-exec-1"
            })),
            next_start_error: RwLock::new(None),
            start_delay: RwLock::new(None),
            scripted: RwLock::new(VecDeque::new()),
            fallback: RwLock::new(Ok(json!({ "status": "queued" }))),
            log_payload: RwLock::new(Ok(json!({ "data": [] }))),
            recipients: RwLock::new(Vec::new()),
            fetched_ids: RwLock::new(Vec::new()),
            status_fetches: AtomicUsize::new(0),
        }
    }

    /// Set the payload returned by `start_call`.
    pub async fn set_start_payload(&self, payload: Value) {
        *self.start_payload.write().await = payload;
    }

    /// Make the next `start_call` fail.
    pub async fn fail_next_start(&self, error: ProviderError) {
        *self.next_start_error.write().await = Some(error);
    }

    /// Delay every `start_call` by `delay`.
    pub async fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.write().await = Some(delay);
    }

    /// Queue a status response for `execution`.
    pub async fn push_status(&self, status: &str, transcript: Option<&str>) {
        self.scripted
            .write()
            .await
            .push_back(Ok(status_payload(status, transcript)));
    }

    /// Queue a failed status fetch.
    pub async fn push_status_error(&self, error: ProviderError) {
        self.scripted.write().await.push_back(Err(error));
    }

    /// Status reported once the scripted responses run out.
    pub async fn set_fallback_status(&self, status: &str, transcript: Option<&str>) {
        *self.fallback.write().await = Ok(status_payload(status, transcript));
    }

    /// Make every unscripted status fetch fail.
    pub async fn set_fallback_error(&self, error: ProviderError) {
        *self.fallback.write().await = Err(error);
    }

    /// Set the response of `execution_log`.
    pub async fn set_log(&self, result: Result<Value, ProviderError>) {
        *self.log_payload.write().await = result;
    }

    /// Recipients passed to `start_call`, in order.
    pub async fn recipients(&self) -> Vec<String> {
        self.recipients.read().await.clone()
    }

    /// Execution ids passed to `execution`, in order.
    pub async fn fetched_ids(&self) -> Vec<String> {
        self.fetched_ids.read().await.clone()
    }

    /// Number of `execution` calls so far.
    pub fn status_fetch_count(&self) -> usize {
        self.status_fetches.load(Ordering::SeqCst)
    }
}

fn status_payload(status: &str, transcript: Option<&str>) -> Value {
    match transcript {
        Some(t) => json!({ "status": status, "transcript": t }),
        None => json!({ "status": status }),
    }
}

#[async_trait]
impl CallProvider for MockCallProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start_call(&self, recipient: &str) -> Result<CallStarted, ProviderError> {
        let delay = *self.start_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.recipients.write().await.push(recipient.to_string());

        if let Some(err) = self.next_start_error.write().await.take() {
            return Err(err);
        }

        let payload = self.start_payload.read().await.clone();
        Ok(CallStarted::from_payload(payload))
    }

    async fn execution(&self, execution_id: &str) -> Result<Value, ProviderError> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.write().await.push(execution_id.to_string());

        let scripted = self.scripted.write().await.pop_front();
        match scripted {
            Some(response) => response,
            None => self.fallback.read().await.clone(),
        }
    }

    async fn execution_log(&self, _execution_id: &str) -> Result<Value, ProviderError> {
        self.log_payload.read().await.clone()
    }
}
