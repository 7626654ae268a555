//! Pluggable note storage.
//!
//! Every backend implements [`NoteStore`]. The concrete backend is chosen
//! once at startup by [`open`] from a [`StoreConfig`] and then shared behind
//! an `Arc<dyn NoteStore>`.
//!
//! Writes are last-write-wins on every backend: upserting an existing `id`
//! replaces its message, author and timestamp. Every backend stores
//! `createdAt` as UTC with millisecond precision and refuses a value that is
//! not an RFC 3339 timestamp.

mod memory;
mod schema;
mod sqlite;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{Provider, StoreConfig};
use crate::models::{canonical_timestamp, Note};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unsupported NOTES_STORAGE_PROVIDER: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid createdAt for note {id}: {value}")]
    InvalidTimestamp { id: String, value: String },

    #[error("Schema initialization failed: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine data directory")]
    DataDir,

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Store handle shared across request handlers.
pub type SharedStore = Arc<dyn NoteStore>;

/// List/upsert capability shared by all backends.
pub trait NoteStore: Send + Sync {
    /// Provider name, reported to clients as `source`.
    fn name(&self) -> &str;

    /// All notes, oldest first.
    fn list(&self) -> Result<Vec<Note>, StoreError>;

    /// Insert the note, or overwrite the stored note with the same `id`.
    /// Returns the record as stored.
    fn upsert(&self, note: Note) -> Result<Note, StoreError>;
}

/// Stand-in for a provider name nobody recognizes.
///
/// Startup still succeeds; every operation reports the misconfiguration.
#[derive(Debug, Clone)]
pub struct UnsupportedStore {
    provider: String,
}

impl UnsupportedStore {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

impl NoteStore for UnsupportedStore {
    fn name(&self) -> &str {
        &self.provider
    }

    fn list(&self) -> Result<Vec<Note>, StoreError> {
        Err(StoreError::UnsupportedProvider(self.provider.clone()))
    }

    fn upsert(&self, _note: Note) -> Result<Note, StoreError> {
        Err(StoreError::UnsupportedProvider(self.provider.clone()))
    }
}

/// The note's `created_at` in stored form.
fn canonical_created_at(note: &Note) -> Result<String, StoreError> {
    canonical_timestamp(&note.created_at).ok_or_else(|| StoreError::InvalidTimestamp {
        id: note.id.clone(),
        value: note.created_at.clone(),
    })
}

/// Build the backend selected by `config`.
pub fn open(config: &StoreConfig) -> Result<SharedStore, StoreError> {
    match &config.provider {
        Provider::Memory => {
            tracing::warn!("Using in-memory note storage; notes are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        Provider::Sqlite => {
            let store = match &config.database_path {
                Some(path) => SqliteStore::open(path.clone())?,
                None => SqliteStore::open_default()?,
            };
            Ok(Arc::new(store))
        }
        Provider::Unsupported(name) => {
            tracing::error!("Unsupported NOTES_STORAGE_PROVIDER: {}", name);
            Ok(Arc::new(UnsupportedStore::new(name.clone())))
        }
    }
}
