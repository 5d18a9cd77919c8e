//! SQLite-backed user store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};

use super::{StoreError, User, UserStore};

/// SQLite-backed user store.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    /// Create a new SQLite user store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite user store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                number TEXT PRIMARY KEY,
                transcript TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let number: String = row.get(0)?;
        let transcript: String = row.get(1)?;
        let created_at_str: String = row.get(2)?;
        let updated_at_str: String = row.get(3)?;

        Ok(User {
            number,
            transcript,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn find_with(conn: &Connection, number: &str) -> Result<Option<User>, StoreError> {
        let result = conn.query_row(
            "SELECT number, transcript, created_at, updated_at FROM users WHERE number = ?",
            params![number],
            Self::row_to_user,
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    )
}

impl UserStore for SqliteUserStore {
    fn create(&self, number: &str) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (number, transcript, created_at, updated_at) VALUES (?, '', ?, ?)",
            params![number, now.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(number.to_string())
            } else {
                StoreError::Database(e.to_string())
            }
        })?;

        Ok(User {
            number: number.to_string(),
            transcript: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn find(&self, number: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        Self::find_with(&conn, number)
    }

    fn update_transcript(&self, number: &str, transcript: &str) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();

        let rows_affected = conn
            .execute(
                "UPDATE users SET transcript = ?, updated_at = ? WHERE number = ?",
                params![transcript, now.to_rfc3339(), number],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(number.to_string()));
        }

        Self::find_with(&conn, number)?.ok_or_else(|| StoreError::NotFound(number.to_string()))
    }
}
