mod handlers;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::store::SharedStore;

pub use handlers::{ErrorBody, ListNotesResponse, NoteResponse, ALLOWED_METHODS};

/// Path the notes endpoint is mounted at.
pub const NOTES_PATH: &str = "/api/notes";

pub fn create_router(store: SharedStore) -> Router {
    let notes = get(handlers::list_notes)
        .post(handlers::create_note)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route(NOTES_PATH, notes)
        .route("/health", get(handlers::health))
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        // Notes change constantly; intermediaries must never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::models::Note;
    use crate::store::{MemoryStore, NoteStore, StoreError};

    struct PanickingStore;

    impl NoteStore for PanickingStore {
        fn name(&self) -> &str {
            "panicking"
        }

        fn list(&self) -> Result<Vec<Note>, StoreError> {
            panic!("storage exploded")
        }

        fn upsert(&self, _note: Note) -> Result<Note, StoreError> {
            panic!("storage exploded")
        }
    }

    async fn send(store: SharedStore, method: Method) -> (StatusCode, Option<String>, String) {
        let response = create_router(store)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(NOTES_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, cache_control, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn unsupported_methods_get_json_405() {
        let (status, cache_control, body) = send(Arc::new(MemoryStore::new()), Method::PUT).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        let body: ErrorBody = serde_json::from_str(&body).unwrap();
        assert_eq!(body.error, "Method not allowed");
    }

    #[tokio::test]
    async fn panics_become_notes_api_errors() {
        let (status, cache_control, body) = send(Arc::new(PanickingStore), Method::GET).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        let body: ErrorBody = serde_json::from_str(&body).unwrap();
        assert_eq!(body.error, "notes_api_error");
        assert_eq!(body.detail.as_deref(), Some("storage exploded"));
    }
}
