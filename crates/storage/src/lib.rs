//! Storage Layer
//!
//! Owns the `entries` table in a single SQLite file. Every read and write of
//! note entries goes through [`EntryStore`].

mod repository;

pub use repository::{Entry, EntryStore, StoreConfig};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store file could not be opened
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A read or write could not be completed
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}
