use std::sync::{Arc, Mutex};

use super::{canonical_created_at, NoteStore, StoreError};
use crate::models::{sort_by_created, Note};

/// Process-lifetime note list.
///
/// Meant for development and tests. Clones share the same list; separate
/// processes do not see each other's notes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    notes: Arc<Mutex<Vec<Note>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn list(&self) -> Result<Vec<Note>, StoreError> {
        let notes = self.notes.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut listed = notes.clone();
        sort_by_created(&mut listed);
        Ok(listed)
    }

    fn upsert(&self, note: Note) -> Result<Note, StoreError> {
        let note = Note {
            created_at: canonical_created_at(&note)?,
            ..note
        };
        let mut notes = self.notes.lock().map_err(|_| StoreError::LockPoisoned)?;
        match notes.iter_mut().find(|existing| existing.id == note.id) {
            Some(existing) => *existing = note.clone(),
            None => notes.push(note.clone()),
        }
        Ok(note)
    }
}
