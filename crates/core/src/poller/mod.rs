//! Completion poller.
//!
//! Waits for a provider execution to reach a terminal status by fetching
//! its status at a fixed interval, up to a fixed number of attempts. There
//! is no backoff and no cancellation: once started, a wait ends either on a
//! terminal status or when the attempt budget runs out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CallsConfig;
use crate::metrics::{POLL_ATTEMPTS, POLL_WAIT_DURATION};
use crate::provider::{CallProvider, ExecutionSnapshot, ExecutionStatus};

/// Errors from waiting on an execution.
#[derive(Debug, Clone, Error)]
pub enum PollError {
    #[error("Timed out waiting for execution {execution_id} after {attempts} attempts")]
    Timeout { execution_id: String, attempts: u32 },
}

/// An execution that reached a terminal status.
#[derive(Debug, Clone)]
pub struct CompletedExecution {
    pub execution_id: String,
    /// The terminal status that ended the wait.
    pub status: ExecutionStatus,
    /// Transcript reported with the terminal status; empty if none.
    pub transcript: String,
    /// Status fetches it took, including the terminal one.
    pub attempts: u32,
}

/// Polls the call provider until an execution finishes.
#[derive(Clone)]
pub struct CompletionPoller {
    provider: Arc<dyn CallProvider>,
    max_attempts: u32,
    interval: Duration,
}

impl CompletionPoller {
    pub fn new(provider: Arc<dyn CallProvider>, max_attempts: u32, interval: Duration) -> Self {
        Self {
            provider,
            max_attempts,
            interval,
        }
    }

    pub fn from_config(provider: Arc<dyn CallProvider>, config: &CallsConfig) -> Self {
        Self::new(
            provider,
            config.max_poll_attempts,
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until `execution_id` reaches a terminal status.
    ///
    /// Failed status fetches count against the attempt budget. No fetch
    /// happens after a terminal status is seen, and there is no sleep after
    /// the final attempt.
    pub async fn wait_for_completion(
        &self,
        execution_id: &str,
    ) -> Result<CompletedExecution, PollError> {
        let started = Instant::now();

        for attempt in 1..=self.max_attempts {
            let fetched = self
                .provider
                .execution(execution_id)
                .await
                .and_then(ExecutionSnapshot::from_payload);

            match fetched {
                Ok(snapshot) if snapshot.status.is_terminal() => {
                    POLL_ATTEMPTS.with_label_values(&["terminal"]).inc();
                    POLL_WAIT_DURATION
                        .with_label_values(&["completed"])
                        .observe(started.elapsed().as_secs_f64());
                    info!(
                        execution_id = execution_id,
                        status = %snapshot.status,
                        attempt = attempt,
                        "Execution reached terminal status"
                    );
                    return Ok(CompletedExecution {
                        execution_id: execution_id.to_string(),
                        status: snapshot.status,
                        transcript: snapshot.transcript.unwrap_or_default(),
                        attempts: attempt,
                    });
                }
                Ok(snapshot) => {
                    POLL_ATTEMPTS.with_label_values(&["pending"]).inc();
                    debug!(
                        execution_id = execution_id,
                        status = %snapshot.status,
                        attempt = attempt,
                        "Execution still running"
                    );
                }
                Err(e) => {
                    POLL_ATTEMPTS.with_label_values(&["error"]).inc();
                    warn!(
                        execution_id = execution_id,
                        attempt = attempt,
                        "Failed to fetch execution status: {}",
                        e
                    );
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        POLL_WAIT_DURATION
            .with_label_values(&["timeout"])
            .observe(started.elapsed().as_secs_f64());
        warn!(
            execution_id = execution_id,
            attempts = self.max_attempts,
            "Gave up waiting for execution"
        );

        Err(PollError::Timeout {
            execution_id: execution_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use crate::testing::MockCallProvider;
    use tokio_test::{assert_err, assert_ok};

    fn poller(provider: &Arc<MockCallProvider>, max_attempts: u32) -> CompletionPoller {
        CompletionPoller::new(
            Arc::clone(provider) as Arc<dyn CallProvider>,
            max_attempts,
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_returns_on_first_terminal_status() {
        let provider = Arc::new(MockCallProvider::new());
        provider.push_status("completed", Some("hello")).await;

        let completed = assert_ok!(poller(&provider, 30).wait_for_completion("abc").await);

        assert_eq!(completed.execution_id, "abc");
        assert_eq!(completed.status, ExecutionStatus::Completed);
        assert_eq!(completed.transcript, "hello");
        assert_eq!(completed.attempts, 1);
        assert_eq!(provider.status_fetch_count(), 1);
        assert_eq!(provider.fetched_ids().await, vec!["abc"]);
    }

    #[tokio::test]
    async fn test_stops_fetching_after_terminal_status() {
        let provider = Arc::new(MockCallProvider::new());
        provider.push_status("queued", None).await;
        provider.push_status("in-progress", None).await;
        provider.push_status("hangup", Some("bye")).await;
        provider.push_status("completed", Some("should not be read")).await;

        let completed = assert_ok!(poller(&provider, 30).wait_for_completion("abc").await);

        assert_eq!(completed.status, ExecutionStatus::Hangup);
        assert_eq!(completed.transcript, "bye");
        assert_eq!(completed.attempts, 3);
        assert_eq!(provider.status_fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_every_terminal_status_ends_the_wait() {
        for status in [
            "completed",
            "failed",
            "call-disconnected",
            "completed_with_error",
            "hangup",
        ] {
            let provider = Arc::new(MockCallProvider::new());
            provider.push_status(status, None).await;

            let completed = assert_ok!(poller(&provider, 5).wait_for_completion("abc").await);
            assert_eq!(completed.status.as_str(), status);
            assert_eq!(provider.status_fetch_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_missing_transcript_is_empty_string() {
        let provider = Arc::new(MockCallProvider::new());
        provider.push_status("failed", None).await;

        let completed = assert_ok!(poller(&provider, 3).wait_for_completion("abc").await);
        assert_eq!(completed.transcript, "");
    }

    #[tokio::test]
    async fn test_exhausts_after_exactly_max_attempts() {
        let provider = Arc::new(MockCallProvider::new());
        provider.set_fallback_status("in-progress", None).await;

        let err = assert_err!(poller(&provider, 30).wait_for_completion("abc").await);

        match err {
            PollError::Timeout {
                execution_id,
                attempts,
            } => {
                assert_eq!(execution_id, "abc");
                assert_eq!(attempts, 30);
            }
        }
        assert_eq!(provider.status_fetch_count(), 30);
    }

    #[tokio::test]
    async fn test_timeout_message_names_execution() {
        let provider = Arc::new(MockCallProvider::new());

        let err = assert_err!(poller(&provider, 2).wait_for_completion("exec-77").await);
        assert!(err.to_string().contains("exec-77"));
    }

    #[tokio::test]
    async fn test_fetch_errors_count_as_attempts() {
        let provider = Arc::new(MockCallProvider::new());
        provider.push_status_error(ProviderError::Timeout).await;
        provider
            .push_status_error(ProviderError::ConnectionFailed("reset".to_string()))
            .await;
        provider.push_status("completed", Some("after errors")).await;

        let completed = assert_ok!(poller(&provider, 30).wait_for_completion("abc").await);
        assert_eq!(completed.transcript, "after errors");
        assert_eq!(completed.attempts, 3);
    }

    #[tokio::test]
    async fn test_only_errors_exhausts_budget() {
        let provider = Arc::new(MockCallProvider::new());
        provider.set_fallback_error(ProviderError::Timeout).await;

        assert_err!(poller(&provider, 4).wait_for_completion("abc").await);
        assert_eq!(provider.status_fetch_count(), 4);
    }

    #[tokio::test]
    async fn test_waits_interval_between_attempts() {
        let provider = Arc::new(MockCallProvider::new());
        provider.push_status("queued", None).await;
        provider.push_status("queued", None).await;
        provider.push_status("completed", None).await;

        let poller = CompletionPoller::new(
            Arc::clone(&provider) as Arc<dyn CallProvider>,
            5,
            Duration::from_millis(20),
        );

        let start = Instant::now();
        assert_ok!(poller.wait_for_completion("abc").await);
        // Two sleeps between three fetches.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_from_config() {
        let provider: Arc<dyn CallProvider> = Arc::new(MockCallProvider::new());
        let poller = CompletionPoller::from_config(provider, &CallsConfig::default());
        assert_eq!(poller.max_attempts(), 30);
        assert_eq!(poller.interval(), Duration::from_secs(10));
    }
}
