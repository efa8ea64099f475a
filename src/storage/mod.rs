//! SQLite persistence for fetched quotes
//!
//! Every quote served by the quote server is appended to the `cotacoes`
//! table. Inserts run on the blocking pool and are bounded by the
//! configured write timeout.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Errors raised by [`QuoteStore`]
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation did not finish within the write timeout
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// A previous holder of the connection panicked
    #[error("Database connection lock poisoned")]
    LockPoisoned,

    /// The blocking task could not be joined
    #[error("Database task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Check if the operation may succeed if repeated
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Task(_))
    }
}

/// A stored quote row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: i64,
    pub bid: String,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only quote table backed by SQLite
#[derive(Clone)]
pub struct QuoteStore {
    conn: Arc<Mutex<Connection>>,
    write_timeout: Duration,
}

impl QuoteStore {
    /// Open (or create) the database file
    pub fn open(path: impl AsRef<Path>, write_timeout: Duration) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn, write_timeout)?;

        tracing::info!(path = %path.display(), "Quote store initialized");
        Ok(store)
    }

    /// Open the database described by configuration
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, StorageError> {
        Self::open(&config.sqlite_path, config.write_timeout())
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?, Duration::from_secs(1))
    }

    fn from_connection(conn: Connection, write_timeout: Duration) -> Result<Self, StorageError> {
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS cotacoes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    bid TEXT,
                    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
                );
                "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            write_timeout,
        })
    }

    /// Append a bid, returning the new row id
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Timeout` when the insert exceeds the write
    /// timeout. A write abandoned this way is rolled back instead of
    /// committed, unless its commit was already underway at the deadline.
    pub async fn save(&self, bid: &str) -> Result<i64, StorageError> {
        let conn = Arc::clone(&self.conn);
        let bid = bid.to_string();
        let write_timeout = self.write_timeout;
        let abandoned = Arc::new(AtomicBool::new(false));
        let task_abandoned = Arc::clone(&abandoned);

        let task = tokio::task::spawn_blocking(move || -> Result<i64, StorageError> {
            let mut conn = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            if task_abandoned.load(Ordering::SeqCst) {
                return Err(StorageError::Timeout(write_timeout));
            }

            let tx = conn.transaction()?;
            let id = {
                let mut stmt = tx.prepare_cached("INSERT INTO cotacoes (bid) VALUES (?1)")?;
                stmt.execute(params![bid])?;
                tx.last_insert_rowid()
            };

            // Dropping the transaction rolls the insert back.
            if task_abandoned.load(Ordering::SeqCst) {
                return Err(StorageError::Timeout(write_timeout));
            }
            tx.commit()?;
            Ok(id)
        });

        match tokio::time::timeout(write_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StorageError::Task(e.to_string())),
            Err(_) => {
                abandoned.store(true, Ordering::SeqCst);
                Err(StorageError::Timeout(write_timeout))
            }
        }
    }

    /// Latest quotes, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<QuoteRecord>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, COALESCE(bid, ''), timestamp FROM cotacoes ORDER BY id DESC LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            let recorded_at: String = row.get(2)?;
            Ok(QuoteRecord {
                id: row.get(0)?,
                bid: row.get(1)?,
                recorded_at: parse_sqlite_timestamp(&recorded_at),
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of stored quotes
    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cotacoes", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Parse SQLite's `CURRENT_TIMESTAMP` format (UTC, `YYYY-MM-DD HH:MM:SS`)
fn parse_sqlite_timestamp(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| {
            tracing::warn!(raw = %raw, "Unparsable quote timestamp");
            DateTime::<Utc>::default()
        })
}
