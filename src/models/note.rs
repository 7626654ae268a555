use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Longest message kept after trimming, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 500;
/// Longest author name kept after trimming, in characters.
pub const MAX_AUTHOR_LENGTH: usize = 80;

/// A short visitor-submitted note.
///
/// A `Note` is always in normalized form: the message is trimmed, non-empty
/// and within [`MAX_MESSAGE_LENGTH`], the author is trimmed and within
/// [`MAX_AUTHOR_LENGTH`], and both `id` and `created_at` are populated.
/// Build one through [`NoteDraft::normalize`] or [`Note::compose`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque identifier; also the idempotency key for writes.
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub author: String,
    /// ISO-8601 timestamp. Lists are ordered by this field.
    pub created_at: String,
}

impl Note {
    /// Build a fresh note from user input, stamping a new id and the current time.
    ///
    /// Returns `None` when the message is blank.
    pub fn compose(message: impl Into<String>, author: impl Into<String>) -> Option<Self> {
        NoteDraft {
            message: Some(Value::String(message.into())),
            author: Some(Value::String(author.into())),
            ..Default::default()
        }
        .normalize()
    }

    /// Re-run normalization on an already typed note.
    pub fn normalized(self) -> Option<Self> {
        NoteDraft::from(self).normalize()
    }
}

/// Untrusted note input: a request body, a cached entry, a database row.
///
/// Every field is an arbitrary JSON value so that partial or oddly typed
/// input can still be coerced the same way regardless of where it came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub id: Option<Value>,
    pub message: Option<Value>,
    pub author: Option<Value>,
    pub created_at: Option<Value>,
}

impl NoteDraft {
    /// Read a draft out of any JSON value. Non-objects yield an empty draft.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Convert the draft into a valid [`Note`], or `None` if the message is empty.
    pub fn normalize(&self) -> Option<Note> {
        let message = coerce(self.message.as_ref()).unwrap_or_default();
        let message = truncate(message.trim(), MAX_MESSAGE_LENGTH);
        if message.is_empty() {
            return None;
        }

        let author = coerce(self.author.as_ref()).unwrap_or_default();

        Some(Note {
            id: coerce(self.id.as_ref()).unwrap_or_else(new_note_id),
            message,
            author: truncate(author.trim(), MAX_AUTHOR_LENGTH),
            created_at: coerce(self.created_at.as_ref()).unwrap_or_else(now_timestamp),
        })
    }
}

impl From<Note> for NoteDraft {
    fn from(note: Note) -> Self {
        Self {
            id: Some(Value::String(note.id)),
            message: Some(Value::String(note.message)),
            author: Some(Value::String(note.author)),
            created_at: Some(Value::String(note.created_at)),
        }
    }
}

/// Normalize every entry, dropping the invalid ones, and order by `created_at`.
pub fn normalize_all<I>(drafts: I) -> Vec<Note>
where
    I: IntoIterator<Item = NoteDraft>,
{
    let mut notes: Vec<Note> = drafts.into_iter().filter_map(|d| d.normalize()).collect();
    sort_by_created(&mut notes);
    notes
}

/// Stable sort, oldest first, by the instant `created_at` denotes.
///
/// Offsets and fractional precision do not affect the order. Timestamps that
/// do not parse sort ahead of all parseable ones, by their raw text.
pub fn sort_by_created(notes: &mut [Note]) {
    notes.sort_by_cached_key(|note| {
        (
            parse_timestamp(&note.created_at),
            note.created_at.clone(),
        )
    });
}

pub fn new_note_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp and render it in UTC with millisecond precision,
/// so canonical text sorts in time order.
pub fn canonical_timestamp(value: &str) -> Option<String> {
    parse_timestamp(value).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn coerce(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Trailing whitespace exposed by the cut is trimmed too, so a second pass is a no-op.
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}
