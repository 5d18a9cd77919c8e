//! Persistence of called phone numbers and their transcripts.

mod sqlite;
mod types;

pub use sqlite::SqliteUserStore;
pub use types::{StoreError, User, UserStore};
