use rusqlite::Connection;

const CREATE_NOTES: &str = "
    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        message TEXT NOT NULL,
        author TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );
    CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at);
";

/// Create the notes table if it is missing. Safe to run repeatedly.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_NOTES)?;
    tracing::info!("Notes schema ready");
    Ok(())
}
