//! UI-facing note state with optimistic updates.
//!
//! A submitted note shows up immediately as [`NoteStatus::Pending`]. Once the
//! save resolves it either becomes [`NoteStatus::Confirmed`], replaced by the
//! stored copy, or is removed. An entry never stays pending after `settle`.

use super::SyncError;
use crate::models::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub note: Note,
    pub status: NoteStatus,
}

/// Outcome of settling a pending note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Confirmed(Note),
    RolledBack,
    /// No pending entry had that id.
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct OptimisticBoard {
    entries: Vec<BoardEntry>,
}

impl OptimisticBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.entries.iter().map(|e| &e.note)
    }

    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == NoteStatus::Pending)
            .count()
    }

    /// Replace confirmed contents with a freshly loaded list.
    ///
    /// Pending entries that the list does not already contain are kept at the end.
    pub fn hydrate(&mut self, notes: Vec<Note>) {
        let pending: Vec<BoardEntry> = self
            .entries
            .drain(..)
            .filter(|e| e.status == NoteStatus::Pending && !notes.iter().any(|n| n.id == e.note.id))
            .collect();

        self.entries = notes
            .into_iter()
            .map(|note| BoardEntry {
                note,
                status: NoteStatus::Confirmed,
            })
            .chain(pending)
            .collect();
    }

    /// Show a new note right away. Returns the pending note to hand to the sync
    /// client, or `None` for a blank message.
    pub fn submit(&mut self, message: &str, author: &str) -> Option<Note> {
        let note = Note::compose(message, author)?;
        self.entries.push(BoardEntry {
            note: note.clone(),
            status: NoteStatus::Pending,
        });
        Some(note)
    }

    /// Apply the result of saving the pending note `id`.
    pub fn settle(&mut self, id: &str, outcome: Result<Note, SyncError>) -> Settlement {
        let Some(index) = self
            .entries
            .iter()
            .position(|e| e.note.id == id && e.status == NoteStatus::Pending)
        else {
            return Settlement::Unknown;
        };

        match outcome {
            Ok(confirmed) => {
                self.entries.remove(index);
                // The stored copy may carry an id that is already on the board.
                self.entries.retain(|e| e.note.id != confirmed.id);
                let index = index.min(self.entries.len());
                self.entries.insert(
                    index,
                    BoardEntry {
                        note: confirmed.clone(),
                        status: NoteStatus::Confirmed,
                    },
                );
                Settlement::Confirmed(confirmed)
            }
            Err(e) => {
                tracing::warn!("Rolling back note {}: {}", id, e);
                self.entries.remove(index);
                Settlement::RolledBack
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed(id: &str, message: &str, created_at: &str) -> Note {
        Note {
            id: id.to_string(),
            message: message.to_string(),
            author: String::new(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn submit_adds_pending_entry() {
        let mut board = OptimisticBoard::new();
        let note = board.submit("hello", "Sam").unwrap();

        assert_eq!(board.entries().len(), 1);
        assert_eq!(board.entries()[0].status, NoteStatus::Pending);
        assert_eq!(board.entries()[0].note, note);
        assert_eq!(board.pending(), 1);
    }

    #[test]
    fn blank_submission_is_ignored() {
        let mut board = OptimisticBoard::new();
        assert!(board.submit("   ", "Sam").is_none());
        assert!(board.entries().is_empty());
    }

    #[test]
    fn success_replaces_pending_with_stored_copy() {
        let mut board = OptimisticBoard::new();
        let pending = board.submit("hello", "").unwrap();
        let stored = Note {
            created_at: "2030-01-01T00:00:00.000Z".to_string(),
            ..pending.clone()
        };

        let outcome = board.settle(&pending.id, Ok(stored.clone()));

        assert_eq!(outcome, Settlement::Confirmed(stored.clone()));
        assert_eq!(
            board.entries(),
            &[BoardEntry {
                note: stored,
                status: NoteStatus::Confirmed
            }]
        );
    }

    #[test]
    fn failure_removes_pending_entry() {
        let mut board = OptimisticBoard::new();
        board.hydrate(vec![confirmed("a", "kept", "2024-01-01T00:00:00.000Z")]);
        let pending = board.submit("doomed", "").unwrap();

        let outcome = board.settle(&pending.id, Err(SyncError::EmptyMessage));

        assert_eq!(outcome, Settlement::RolledBack);
        let ids: Vec<_> = board.notes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn settling_twice_is_a_no_op() {
        let mut board = OptimisticBoard::new();
        let pending = board.submit("hello", "").unwrap();
        board.settle(&pending.id, Ok(pending.clone()));

        assert_eq!(
            board.settle(&pending.id, Err(SyncError::EmptyMessage)),
            Settlement::Unknown
        );
        assert_eq!(board.entries().len(), 1);
    }

    #[test]
    fn confirmation_never_leaves_a_duplicate() {
        let mut board = OptimisticBoard::new();
        board.hydrate(vec![confirmed("server-id", "old", "2024-01-01T00:00:00.000Z")]);
        let pending = board.submit("new", "").unwrap();

        board.settle(
            &pending.id,
            Ok(confirmed("server-id", "new", "2024-01-02T00:00:00.000Z")),
        );

        assert_eq!(board.entries().len(), 1);
        assert_eq!(board.entries()[0].note.message, "new");
        assert_eq!(board.pending(), 0);
    }

    #[test]
    fn hydrate_keeps_unsaved_pending_notes() {
        let mut board = OptimisticBoard::new();
        let pending = board.submit("in flight", "").unwrap();

        board.hydrate(vec![confirmed("a", "loaded", "2024-01-01T00:00:00.000Z")]);

        let ids: Vec<_> = board.notes().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec!["a".to_string(), pending.id]);
        assert_eq!(board.pending(), 1);
    }
}
