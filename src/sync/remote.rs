//! HTTP client for the notes endpoint.
//!
//! Every request is bounded by the configured timeout. A timeout, a network
//! failure, a non-2xx status and an undecodable body are all reported as a
//! [`ClientError`]; callers decide whether that is fatal.

use std::time::Duration;

use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{normalize_all, Note, NoteDraft};

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notes {method} failed with status {status}: {body}")]
    Status {
        method: &'static str,
        status: StatusCode,
        body: String,
    },
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    notes: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct CreateEnvelope {
    #[serde(default)]
    note: Option<Value>,
}

/// Client for `GET`/`POST` on the notes endpoint.
#[derive(Debug, Clone)]
pub struct RemoteNotes {
    endpoint: String,
    client: Client,
}

impl RemoteNotes {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch all notes, normalized and oldest first. Invalid entries are dropped.
    pub async fn list(&self) -> Result<Vec<Note>, ClientError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body: ListEnvelope = self.handle_response("GET", response).await?;

        let drafts = body
            .notes
            .unwrap_or_default()
            .into_iter()
            .map(NoteDraft::from_value);
        Ok(normalize_all(drafts))
    }

    /// Persist a note and return the server's copy.
    ///
    /// Falls back to the submitted note when the response carries no usable one.
    pub async fn create(&self, note: &Note) -> Result<Note, ClientError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(note)
            .send()
            .await?;
        let body: CreateEnvelope = self.handle_response("POST", response).await?;

        Ok(body
            .note
            .map(NoteDraft::from_value)
            .and_then(|draft| draft.normalize())
            .unwrap_or_else(|| note.clone()))
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        method: &'static str,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Status {
                method,
                status,
                body,
            })
        }
    }
}
