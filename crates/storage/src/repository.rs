//! Entry Store Implementation

use crate::StorageError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{FromRow, Row};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const CREATE_ENTRIES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    )";

// `created_at` is read back as text so older files with NULL or non-text
// timestamps still list.
const SELECT_ENTRIES: &str = "
    SELECT id, content, CAST(created_at AS TEXT) AS created_at
    FROM entries
    ORDER BY entries.created_at DESC, entries.id DESC";

const SELECT_ENTRY_BY_ID: &str =
    "SELECT id, content, CAST(created_at AS TEXT) AS created_at FROM entries WHERE id = ?";

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const INSERT_ENTRY: &str = "INSERT INTO entries (content) VALUES (?)";

/// A persisted note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned id, strictly increasing and never reused
    pub id: i64,
    /// Trimmed, non-empty text
    pub content: String,
    /// Store clock at insert time; ordering key only.
    /// `None` when a pre-existing row holds NULL or an unrecognised value.
    pub created_at: Option<NaiveDateTime>,
}

impl<'r> FromRow<'r, SqliteRow> for Entry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let created_at: Option<String> = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            created_at: created_at.as_deref().and_then(parse_timestamp),
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the SQLite file, created if missing
    pub database_path: PathBuf,
    /// Upper bound on pooled connections (each runs on its own worker thread)
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("app.db"),
            max_connections: 4,
            busy_timeout_ms: 5000,
        }
    }
}

/// Ordered, durable persistence of note entries.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EntryStore {
    pool: SqlitePool,
}

impl EntryStore {
    /// Open the store file described by `config`
    pub async fn connect(config: &StoreConfig) -> Result<Self, StorageError> {
        info!(
            "Opening entry store at {} (max {} connections)",
            config.database_path.display(),
            config.max_connections
        );

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Create the `entries` table if it does not exist yet.
    ///
    /// Safe to run on every startup against an existing store file.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_ENTRIES_TABLE).execute(&self.pool).await?;
        debug!("Entries table ready");
        Ok(())
    }

    /// All entries, newest first (`created_at` descending, then `id` descending)
    pub async fn list_entries(&self) -> Result<Vec<Entry>, StorageError> {
        let entries = sqlx::query_as::<_, Entry>(SELECT_ENTRIES)
            .fetch_all(&self.pool)
            .await?;

        debug!("Listed {} entries", entries.len());
        Ok(entries)
    }

    /// Insert one entry and return the row exactly as committed.
    ///
    /// The insert and the read-back share one transaction. If the returned
    /// future is dropped before commit the transaction rolls back.
    pub async fn create_entry(&self, content: &str) -> Result<Entry, StorageError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(INSERT_ENTRY)
            .bind(content)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        let entry = sqlx::query_as::<_, Entry>(SELECT_ENTRY_BY_ID)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Inserted entry with ID {}", entry.id);
        Ok(entry)
    }

    /// Number of stored entries
    pub async fn count_entries(&self) -> Result<i64, StorageError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Entry store closed");
    }
}
