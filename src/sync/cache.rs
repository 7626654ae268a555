//! Device-local note cache.
//!
//! The whole note list lives as one JSON array under [`LOCAL_STORAGE_KEY`]
//! and is always read and written wholesale.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::models::{normalize_all, sort_by_created, Note, NoteDraft};

pub const LOCAL_STORAGE_KEY: &str = "portfolio-sky-notes-v1";

/// String key/value persistence local to this device.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the user's data directory.
    pub fn open_default() -> io::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "skynotes").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine data directory")
        })?;
        Ok(Self::new(dirs.data_dir().join("local")))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)
    }
}

/// In-process key/value store. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn poisoned() -> io::Error {
    io::Error::other("key/value store lock poisoned")
}

/// Normalized view of the cached note list.
#[derive(Debug, Clone)]
pub struct LocalNoteCache<S> {
    store: S,
}

impl<S: KeyValueStore> LocalNoteCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Cached notes, oldest first. Missing, unreadable or corrupt content reads as empty.
    pub fn read(&self) -> Vec<Note> {
        let raw = match self.store.get(LOCAL_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read local notes: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => {
                normalize_all(entries.into_iter().map(NoteDraft::from_value))
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!("Discarding corrupt local notes: {}", e);
                Vec::new()
            }
        }
    }

    /// Replace the cached list.
    pub fn write(&self, mut notes: Vec<Note>) -> io::Result<()> {
        sort_by_created(&mut notes);
        let raw = serde_json::to_string(&notes)?;
        self.store.set(LOCAL_STORAGE_KEY, &raw)
    }

    pub fn append(&self, note: Note) -> io::Result<()> {
        let mut notes = self.read();
        notes.push(note);
        self.write(notes)
    }

    /// Drop any cached entry with `replaced_id`, then add `note`.
    pub fn merge(&self, replaced_id: &str, note: Note) -> io::Result<()> {
        let mut notes = self.read();
        notes.retain(|n| n.id != replaced_id);
        notes.push(note);
        self.write(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, created_at: &str) -> Note {
        Note {
            id: id.to_string(),
            message: format!("note {}", id),
            author: String::new(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn empty_store_reads_empty() {
        let cache = LocalNoteCache::new(MemoryKeyValueStore::new());
        assert!(cache.read().is_empty());
    }

    #[test]
    fn corrupt_json_reads_empty() {
        let store = MemoryKeyValueStore::new();
        store.set(LOCAL_STORAGE_KEY, "{not json").unwrap();
        assert!(LocalNoteCache::new(store.clone()).read().is_empty());

        store.set(LOCAL_STORAGE_KEY, r#"{"notes": []}"#).unwrap();
        assert!(LocalNoteCache::new(store).read().is_empty());
    }

    #[test]
    fn read_drops_invalid_entries() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                LOCAL_STORAGE_KEY,
                r#"[{"id":"a","message":"kept","createdAt":"2024-01-01T00:00:00.000Z"},
                    {"id":"b","message":"   "},
                    42]"#,
            )
            .unwrap();

        let notes = LocalNoteCache::new(store).read();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "a");
    }

    #[test]
    fn write_keeps_notes_sorted() {
        let cache = LocalNoteCache::new(MemoryKeyValueStore::new());
        cache
            .write(vec![
                note("late", "2024-02-01T00:00:00.000Z"),
                note("early", "2024-01-01T00:00:00.000Z"),
            ])
            .unwrap();
        cache.append(note("middle", "2024-01-15T00:00:00.000Z")).unwrap();

        let ids: Vec<_> = cache.read().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn orders_mixed_precision_by_instant() {
        let cache = LocalNoteCache::new(MemoryKeyValueStore::new());
        cache
            .write(vec![
                note("later", "2024-01-01T00:00:00.500Z"),
                note("earlier", "2024-01-01T00:00:00Z"),
                note("earliest", "2023-12-31T23:00:00-00:30"),
            ])
            .unwrap();

        let ids: Vec<_> = cache.read().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["earliest", "earlier", "later"]);
    }

    #[test]
    fn merge_replaces_by_id() {
        let cache = LocalNoteCache::new(MemoryKeyValueStore::new());
        cache.append(note("a", "2024-01-01T00:00:00.000Z")).unwrap();

        let mut confirmed = note("a", "2024-01-01T00:00:01.000Z");
        confirmed.message = "confirmed".to_string();
        cache.merge("a", confirmed.clone()).unwrap();

        assert_eq!(cache.read(), vec![confirmed]);
    }

    #[test]
    fn file_store_round_trips_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalNoteCache::new(FileKeyValueStore::new(dir.path().join("local")));
        cache.append(note("a", "2024-01-01T00:00:00.000Z")).unwrap();

        let reopened = LocalNoteCache::new(FileKeyValueStore::new(dir.path().join("local")));
        assert_eq!(reopened.read().len(), 1);
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        assert_eq!(store.get("absent").unwrap(), None);
    }
}
