//! Types for the voice call provider.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of a provider-side execution (one call attempt).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Queued,
    Scheduled,
    Initiated,
    Ringing,
    InProgress,
    Completed,
    Failed,
    CallDisconnected,
    CompletedWithError,
    Hangup,
    NoAnswer,
    Busy,
    /// Anything the provider reports that we don't model explicitly.
    Other(String),
}

impl ExecutionStatus {
    /// Wire representation as reported by the provider.
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Queued => "queued",
            ExecutionStatus::Scheduled => "scheduled",
            ExecutionStatus::Initiated => "initiated",
            ExecutionStatus::Ringing => "ringing",
            ExecutionStatus::InProgress => "in-progress",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::CallDisconnected => "call-disconnected",
            ExecutionStatus::CompletedWithError => "completed_with_error",
            ExecutionStatus::Hangup => "hangup",
            ExecutionStatus::NoAnswer => "no-answer",
            ExecutionStatus::Busy => "busy",
            ExecutionStatus::Other(s) => s,
        }
    }

    /// Whether the provider will stop updating the execution after this status.
    ///
    /// Only `completed`, `failed`, `call-disconnected`, `completed_with_error`
    /// and `hangup` end the wait; everything else keeps polling.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed
                | ExecutionStatus::Failed
                | ExecutionStatus::CallDisconnected
                | ExecutionStatus::CompletedWithError
                | ExecutionStatus::Hangup
        )
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "queued" => ExecutionStatus::Queued,
            "scheduled" => ExecutionStatus::Scheduled,
            "initiated" => ExecutionStatus::Initiated,
            "ringing" => ExecutionStatus::Ringing,
            "in-progress" => ExecutionStatus::InProgress,
            "completed" => ExecutionStatus::Completed,
            "failed" => ExecutionStatus::Failed,
            "call-disconnected" => ExecutionStatus::CallDisconnected,
            "completed_with_error" => ExecutionStatus::CompletedWithError,
            "hangup" => ExecutionStatus::Hangup,
            "no-answer" => ExecutionStatus::NoAnswer,
            "busy" => ExecutionStatus::Busy,
            other => ExecutionStatus::Other(other.to_string()),
        }
    }
}

impl FromStr for ExecutionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExecutionStatus::from(s))
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExecutionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExecutionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ExecutionStatus::from(s.as_str()))
    }
}

/// Result of a successful call-start request.
#[derive(Debug, Clone)]
pub struct CallStarted {
    /// Provider-assigned execution id, if the provider returned one.
    pub execution_id: Option<String>,
    /// Raw response body from the provider.
    pub payload: Value,
}

impl CallStarted {
    /// Build from the provider's response body.
    ///
    /// The execution id is read from `execution_id`, falling back to `id`.
    pub fn from_payload(payload: Value) -> Self {
        let execution_id = ["execution_id", "id"]
            .iter()
            .filter_map(|key| payload.get(*key).and_then(Value::as_str))
            .find(|id| !id.is_empty())
            .map(str::to_string);

        Self {
            execution_id,
            payload,
        }
    }
}

/// Point-in-time view of an execution.
#[derive(Debug, Clone)]
pub struct ExecutionSnapshot {
    pub status: ExecutionStatus,
    /// Transcript text, once the provider has one.
    pub transcript: Option<String>,
    /// Raw response body from the provider.
    pub payload: Value,
}

impl ExecutionSnapshot {
    /// Parse status and transcript out of the provider's execution payload.
    pub fn from_payload(payload: Value) -> Result<Self, ProviderError> {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("execution payload has no status".to_string())
            })?;
        let status = ExecutionStatus::from(status);

        let transcript = payload
            .get("transcript")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            status,
            transcript,
            payload,
        })
    }
}

/// Errors that can occur when talking to the call provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Call provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Call provider request timed out")]
    Timeout,

    /// The provider answered with a non-2xx status.
    #[error("Call provider returned HTTP {status}")]
    Api { status: u16, body: Value },

    #[error("Invalid response from call provider: {0}")]
    InvalidResponse(String),
}

/// Trait for voice call provider backends.
#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Ask the provider to call `recipient`.
    async fn start_call(&self, recipient: &str) -> Result<CallStarted, ProviderError>;

    /// Fetch the raw execution payload (status, transcript, ...).
    ///
    /// Use [`ExecutionSnapshot::from_payload`] to read the status out of it.
    async fn execution(&self, execution_id: &str) -> Result<Value, ProviderError>;

    /// Fetch the raw execution log.
    async fn execution_log(&self, execution_id: &str) -> Result<Value, ProviderError>;
}
