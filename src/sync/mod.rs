//! Client-side note synchronization.
//!
//! [`NoteSyncClient`] reconciles the device-local [`LocalNoteCache`] with the
//! remote notes endpoint according to a [`SyncMode`]:
//!
//! - `local`: the cache is the only store; no network calls are made.
//! - `remote`: the endpoint is authoritative and its failures reach the caller.
//! - `auto`: try the endpoint, fall back to the cache on any failure.
//!
//! Operations only ever reject in `remote` mode (or for an empty message), so
//! a UI can apply an [`OptimisticBoard`] update before a save resolves.

mod cache;
mod optimistic;
mod remote;

use std::io;

use thiserror::Error;

use crate::config::{SyncConfig, SyncMode};
use crate::models::Note;

pub use cache::{
    FileKeyValueStore, KeyValueStore, LocalNoteCache, MemoryKeyValueStore, LOCAL_STORAGE_KEY,
};
pub use optimistic::{BoardEntry, NoteStatus, OptimisticBoard, Settlement};
pub use remote::{ClientError, RemoteNotes};

/// Sync client errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cannot save empty note")]
    EmptyMessage,

    #[error(transparent)]
    Remote(#[from] ClientError),

    #[error("Local note cache error: {0}")]
    Cache(#[from] io::Error),
}

pub struct NoteSyncClient<S> {
    mode: SyncMode,
    remote: RemoteNotes,
    cache: LocalNoteCache<S>,
}

impl<S: KeyValueStore> NoteSyncClient<S> {
    pub fn new(config: &SyncConfig, store: S) -> Result<Self, SyncError> {
        Ok(Self::with_remote(
            config.mode,
            RemoteNotes::new(config.api_url.clone(), config.timeout)?,
            store,
        ))
    }

    pub fn with_remote(mode: SyncMode, remote: RemoteNotes, store: S) -> Self {
        Self {
            mode,
            remote,
            cache: LocalNoteCache::new(store),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn cache(&self) -> &LocalNoteCache<S> {
        &self.cache
    }

    /// Load the current note list, oldest first.
    pub async fn load_notes(&self) -> Result<Vec<Note>, SyncError> {
        match self.mode {
            SyncMode::Local => Ok(self.cache.read()),
            SyncMode::Remote => self.load_remote().await,
            SyncMode::Auto => match self.load_remote().await {
                Ok(notes) => Ok(notes),
                Err(e) => {
                    tracing::warn!("Remote notes unavailable, using local cache: {}", e);
                    Ok(self.cache.read())
                }
            },
        }
    }

    /// Persist a note and return the copy that was saved.
    ///
    /// In `auto` mode a failed remote write keeps the normalized note in the
    /// local cache only.
    pub async fn save_note(&self, note: Note) -> Result<Note, SyncError> {
        let note = note.normalized().ok_or(SyncError::EmptyMessage)?;

        match self.mode {
            SyncMode::Local => {
                self.cache.append(note.clone())?;
                Ok(note)
            }
            SyncMode::Remote => self.save_remote(&note).await,
            SyncMode::Auto => match self.save_remote(&note).await {
                Ok(saved) => Ok(saved),
                Err(e) => {
                    tracing::warn!("Remote save failed, keeping note {} locally: {}", note.id, e);
                    self.cache.append(note.clone())?;
                    Ok(note)
                }
            },
        }
    }

    /// Fetch the remote list and mirror it into the cache wholesale.
    async fn load_remote(&self) -> Result<Vec<Note>, SyncError> {
        let notes = self.remote.list().await?;
        self.cache.write(notes.clone())?;
        tracing::debug!("Loaded {} notes from {}", notes.len(), self.remote.endpoint());
        Ok(notes)
    }

    async fn save_remote(&self, note: &Note) -> Result<Note, SyncError> {
        let saved = self.remote.create(note).await?;
        self.cache.merge(&note.id, saved.clone())?;
        Ok(saved)
    }
}
