//! Types for the call flow.

use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::provider::{ExecutionStatus, ProviderError};
use crate::store::StoreError;

/// Status tag reported once a transcript has been collected.
pub const STATUS_COMPLETED: &str = "completed_with_transcript";

/// Status tag reported while the transcript is still outstanding.
pub const STATUS_PENDING: &str = "call_initiated_transcript_pending";

/// A validated phone number.
///
/// Any string that is non-empty after trimming whitespace; the trimmed
/// form is what gets stored and dialled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, CallError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CallError::InvalidPhoneNumber);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from starting a call.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("Invalid phone number")]
    InvalidPhoneNumber,

    /// Creating the user record failed for a reason other than a duplicate.
    #[error("Failed to persist phone number: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to trigger call: {0}")]
    Provider(#[from] ProviderError),

    #[error("Call provider did not return an execution id")]
    MissingExecutionId,
}

/// How a call start ended from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    /// The execution finished and its transcript was collected.
    Completed {
        status: ExecutionStatus,
        transcript: String,
    },
    /// The call was placed but no transcript is available yet.
    Pending,
}

/// Outcome of a call start.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub phone_number: PhoneNumber,
    pub execution_id: String,
    /// Raw call-start response from the provider.
    pub provider_payload: Value,
    pub result: CallResult,
}

impl CallOutcome {
    pub fn status_tag(&self) -> &'static str {
        match self.result {
            CallResult::Completed { .. } => STATUS_COMPLETED,
            CallResult::Pending => STATUS_PENDING,
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match &self.result {
            CallResult::Completed { transcript, .. } => Some(transcript),
            CallResult::Pending => None,
        }
    }
}

/// A call whose completion is being watched in the background.
#[derive(Debug)]
pub struct DetachedCall {
    pub outcome: CallOutcome,
    /// Handle to the watcher task. Dropping it leaves the watcher running.
    pub watcher: JoinHandle<()>,
}
