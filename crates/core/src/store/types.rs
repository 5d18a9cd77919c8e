//! User record storage trait and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A phone number we have called, with the latest transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Phone number (unique key).
    pub number: String,
    /// Transcript of the most recent completed call; empty until one arrives.
    pub transcript: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether a non-empty transcript has been stored.
    pub fn has_transcript(&self) -> bool {
        !self.transcript.is_empty()
    }
}

/// Error type for user store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record for this number already exists.
    #[error("User already exists: {0}")]
    Duplicate(String),

    /// No record for this number.
    #[error("User not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for user storage backends.
pub trait UserStore: Send + Sync {
    /// Create a record with an empty transcript.
    ///
    /// Fails with [`StoreError::Duplicate`] if the number is already stored.
    fn create(&self, number: &str) -> Result<User, StoreError>;

    /// Get a record by phone number.
    fn find(&self, number: &str) -> Result<Option<User>, StoreError>;

    /// Replace the transcript of an existing record.
    fn update_transcript(&self, number: &str, transcript: &str) -> Result<User, StoreError>;
}
