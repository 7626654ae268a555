use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use rusqlite::{Connection, Row};
use serde_json::Value;

use super::{canonical_created_at, schema, NoteStore, StoreError};
use crate::models::{canonical_timestamp, normalize_all, Note, NoteDraft};

/// Relational note storage on SQLite.
///
/// The table is created lazily on first use. Schema readiness is established
/// at most once per store; clones share both the connection and the outcome.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    ready: Arc<OnceLock<Result<(), String>>>,
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::info!("Opened note database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_default() -> Result<Self, StoreError> {
        let dirs =
            directories::ProjectDirs::from("", "", "skynotes").ok_or(StoreError::DataDir)?;
        Self::open(dirs.data_dir().join("notes.db"))
    }

    pub fn open_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            ready: Arc::new(OnceLock::new()),
        }
    }

    /// Lock the connection, creating the schema on first use.
    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        self.ready
            .get_or_init(|| schema::ensure_schema(&conn).map_err(|e| e.to_string()))
            .clone()
            .map_err(StoreError::Schema)?;
        Ok(conn)
    }
}

impl NoteStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn list(&self) -> Result<Vec<Note>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, message, author, created_at
             FROM notes ORDER BY created_at ASC",
        )?;

        let drafts = stmt
            .query_map([], row_to_draft)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(normalize_all(drafts))
    }

    fn upsert(&self, note: Note) -> Result<Note, StoreError> {
        let created_at = canonical_created_at(&note)?;

        let conn = self.connection()?;
        let draft = conn.query_row(
            "INSERT INTO notes (id, message, author, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                message = excluded.message,
                author = excluded.author,
                created_at = excluded.created_at
             RETURNING id, message, author, created_at",
            (&note.id, &note.message, &note.author, &created_at),
            row_to_draft,
        )?;

        tracing::debug!("Upserted note {}", note.id);

        Ok(draft.normalize().unwrap_or(Note { created_at, ..note }))
    }
}

fn row_to_draft(row: &Row<'_>) -> rusqlite::Result<NoteDraft> {
    let created_at: String = row.get(3)?;
    Ok(NoteDraft {
        id: Some(Value::String(row.get(0)?)),
        message: row.get::<_, Option<String>>(1)?.map(Value::String),
        author: row.get::<_, Option<String>>(2)?.map(Value::String),
        created_at: Some(Value::String(
            canonical_timestamp(&created_at).unwrap_or(created_at),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_created_once_per_store() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.ready.get().is_none());

        store.list().unwrap();
        assert_eq!(store.ready.get(), Some(&Ok(())));

        let clone = store.clone();
        clone.list().unwrap();
        assert!(Arc::ptr_eq(&store.ready, &clone.ready));
    }

    #[test]
    fn drops_rows_with_blank_messages() {
        let store = SqliteStore::open_memory().unwrap();
        store.list().unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO notes (id, message, author, created_at)
                 VALUES ('blank', '   ', '', '2024-01-01T00:00:00.000Z')",
                [],
            )
            .unwrap();
        }

        let kept = store
            .upsert(Note::compose("kept", "").unwrap())
            .unwrap();

        let notes = store.list().unwrap();
        assert_eq!(notes, vec![kept]);
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let store = SqliteStore::open_memory().unwrap();
        let note = Note {
            created_at: "not a date".to_string(),
            ..Note::compose("hello", "").unwrap()
        };

        assert!(matches!(
            store.upsert(note),
            Err(StoreError::InvalidTimestamp { .. })
        ));
    }
}
