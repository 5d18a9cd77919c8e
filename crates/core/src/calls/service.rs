//! Call flow: persist the number, start the call, wait for the transcript.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use prometheus::IntGauge;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::CallsConfig;
use crate::metrics::{CALLS_STARTED, DETACHED_WATCHERS_ACTIVE, TRANSCRIPTS_PERSISTED};
use crate::poller::CompletionPoller;
use crate::provider::{CallProvider, ProviderError};
use crate::store::{StoreError, User, UserStore};

use super::registry::ExecutionRegistry;
use super::types::{CallError, CallOutcome, CallResult, DetachedCall, PhoneNumber};

/// A started provider execution.
struct Initiated {
    execution_id: String,
    payload: Value,
}

/// Orchestrates calls across the provider, the poller and the store.
pub struct CallService {
    provider: Arc<dyn CallProvider>,
    store: Arc<dyn UserStore>,
    poller: CompletionPoller,
    executions: ExecutionRegistry,
}

impl CallService {
    pub fn new(
        provider: Arc<dyn CallProvider>,
        store: Arc<dyn UserStore>,
        config: &CallsConfig,
    ) -> Self {
        Self {
            poller: CompletionPoller::from_config(Arc::clone(&provider), config),
            provider,
            store,
            executions: ExecutionRegistry::new(config.execution_cache_size),
        }
    }

    /// Start a call and wait until the execution finishes.
    ///
    /// If the wait runs out the call is still reported as placed, with a
    /// pending result and no transcript.
    pub async fn start_and_wait(&self, phone: &PhoneNumber) -> Result<CallOutcome, CallError> {
        let initiated = self.initiate(phone).await?;

        // The wait runs in its own task so a dropped request cannot cut it short
        let waiter = tokio::spawn(wait_and_persist(
            self.poller.clone(),
            Arc::clone(&self.store),
            phone.clone(),
            initiated.execution_id.clone(),
        ));
        let result = match waiter.await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    phone_number = %phone,
                    execution_id = %initiated.execution_id,
                    "Completion wait failed: {}",
                    e
                );
                CallResult::Pending
            }
        };

        Ok(CallOutcome {
            phone_number: phone.clone(),
            execution_id: initiated.execution_id,
            provider_payload: initiated.payload,
            result,
        })
    }

    /// Start a call and return immediately; a background watcher waits for
    /// the execution and stores the transcript when it arrives.
    pub async fn start_detached(&self, phone: &PhoneNumber) -> Result<DetachedCall, CallError> {
        let initiated = self.initiate(phone).await?;
        let watcher = self.spawn_watcher(phone.clone(), initiated.execution_id.clone());

        Ok(DetachedCall {
            outcome: CallOutcome {
                phone_number: phone.clone(),
                execution_id: initiated.execution_id,
                provider_payload: initiated.payload,
                result: CallResult::Pending,
            },
            watcher,
        })
    }

    /// Raw execution payload from the provider.
    pub async fn execution(&self, execution_id: &str) -> Result<Value, ProviderError> {
        self.provider.execution(execution_id).await
    }

    /// Raw execution log from the provider.
    pub async fn execution_log(&self, execution_id: &str) -> Result<Value, ProviderError> {
        self.provider.execution_log(execution_id).await
    }

    /// Stored record for `phone`, if it was ever called.
    pub fn transcript(&self, phone: &PhoneNumber) -> Result<Option<User>, StoreError> {
        self.store.find(phone.as_str())
    }

    /// Most recent execution started for `phone` by this process.
    pub async fn latest_execution(&self, phone: &PhoneNumber) -> Option<String> {
        self.executions.latest(phone.as_str()).await
    }

    /// Persist the number (ignoring duplicates), then ask the provider to call it.
    async fn initiate(&self, phone: &PhoneNumber) -> Result<Initiated, CallError> {
        match self.store.create(phone.as_str()) {
            Ok(_) => debug!(phone_number = %phone, "Stored new phone number"),
            Err(StoreError::Duplicate(_)) => {
                debug!(phone_number = %phone, "Phone number already stored")
            }
            Err(e) => {
                CALLS_STARTED.with_label_values(&["store_error"]).inc();
                error!(phone_number = %phone, "Failed to persist phone number: {}", e);
                return Err(CallError::Store(e));
            }
        }

        let started = match self.provider.start_call(phone.as_str()).await {
            Ok(started) => started,
            Err(e) => {
                CALLS_STARTED.with_label_values(&["provider_error"]).inc();
                error!(
                    phone_number = %phone,
                    provider = self.provider.name(),
                    "Failed to trigger call: {}",
                    e
                );
                return Err(CallError::Provider(e));
            }
        };

        let Some(execution_id) = started.execution_id else {
            CALLS_STARTED
                .with_label_values(&["missing_execution_id"])
                .inc();
            error!(phone_number = %phone, "Call provider returned no execution id");
            return Err(CallError::MissingExecutionId);
        };

        CALLS_STARTED.with_label_values(&["started"]).inc();
        self.executions.record(phone.as_str(), &execution_id).await;
        info!(
            phone_number = %phone,
            execution_id = %execution_id,
            "Call started"
        );

        Ok(Initiated {
            execution_id,
            payload: started.payload,
        })
    }

    /// Spawn a fire-and-forget watcher for `execution_id`.
    ///
    /// Errors and panics inside the watcher are logged and never reach the
    /// caller.
    fn spawn_watcher(&self, phone: PhoneNumber, execution_id: String) -> JoinHandle<()> {
        let poller = self.poller.clone();
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            let _active = GaugeGuard::new(&DETACHED_WATCHERS_ACTIVE);
            let watch = wait_and_persist(poller, store, phone.clone(), execution_id.clone());
            if AssertUnwindSafe(watch).catch_unwind().await.is_err() {
                error!(
                    phone_number = %phone,
                    execution_id = %execution_id,
                    "Completion watcher panicked"
                );
            }
        })
    }
}

/// Holds a gauge one higher for as long as it lives.
struct GaugeGuard(IntGauge);

impl GaugeGuard {
    fn new(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Wait for `execution_id` to finish and store its transcript.
///
/// A failed store write is logged; the transcript is still returned.
async fn wait_and_persist(
    poller: CompletionPoller,
    store: Arc<dyn UserStore>,
    phone: PhoneNumber,
    execution_id: String,
) -> CallResult {
    match poller.wait_for_completion(&execution_id).await {
        Ok(completed) => {
            if let Err(e) = persist_transcript(store.as_ref(), &phone, &completed.transcript) {
                error!(
                    phone_number = %phone,
                    execution_id = %execution_id,
                    "Failed to persist transcript: {}",
                    e
                );
            }
            CallResult::Completed {
                status: completed.status,
                transcript: completed.transcript,
            }
        }
        Err(e) => {
            warn!(phone_number = %phone, "Transcript still pending: {}", e);
            CallResult::Pending
        }
    }
}

fn persist_transcript(
    store: &dyn UserStore,
    phone: &PhoneNumber,
    transcript: &str,
) -> Result<User, StoreError> {
    let user = store.update_transcript(phone.as_str(), transcript)?;
    TRANSCRIPTS_PERSISTED.inc();
    info!(
        phone_number = %phone,
        transcript_len = transcript.len(),
        "Transcript stored"
    );
    Ok(user)
}
