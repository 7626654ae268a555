use std::any::Any;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::*;
use crate::store::SharedStore;

pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

/// Body of `GET /api/notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
    pub source: String,
}

/// Body of a successful `POST /api/notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteResponse {
    pub note: Note,
    pub source: String,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

// ============================================================
// Error Handling
// ============================================================

/// Log the failure server-side and report it as a uniform 500 payload.
/// Only the error's display string reaches the client.
fn internal_error(e: impl std::fmt::Display) -> ApiError {
    let detail = e.to_string();
    tracing::error!("Notes API error: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "notes_api_error".to_string(),
            detail: Some(detail),
        }),
    )
}

fn bad_request(message: &str) -> ApiError {
    tracing::warn!("Rejected note: {}", message);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
            detail: None,
        }),
    )
}

/// Turns a panic anywhere below the router into the same 500 payload.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown_error".to_string()
    };
    internal_error(detail).into_response()
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Notes
// ============================================================

pub async fn list_notes(
    State(store): State<SharedStore>,
) -> Result<Json<ListNotesResponse>, ApiError> {
    let notes = store.list().map_err(internal_error)?;
    Ok(Json(ListNotesResponse {
        notes,
        source: store.name().to_string(),
    }))
}

/// Create a note, or overwrite the note with the same `id`.
///
/// An absent body counts as `{}`. A body that is not valid JSON is an
/// internal error, not a validation error.
pub async fn create_note(
    State(store): State<SharedStore>,
    body: Bytes,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let value: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(internal_error)?
    };

    let note = NoteDraft::from_value(value)
        .normalize()
        .ok_or_else(|| bad_request("message is required"))?;

    let saved = store.upsert(note).map_err(internal_error)?;
    tracing::info!("Stored note {} via {}", saved.id, store.name());

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            note: saved,
            source: store.name().to_string(),
        }),
    ))
}

pub async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::ALLOW, ALLOWED_METHODS)])
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        Json(ErrorBody {
            error: "Method not allowed".to_string(),
            detail: None,
        }),
    )
}
