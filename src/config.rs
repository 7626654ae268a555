//! Environment-driven configuration.
//!
//! Server side:
//! - `NOTES_STORAGE_PROVIDER` - `memory` or `sqlite`. Defaults to `sqlite` when
//!   `NOTES_DATABASE_PATH` is set, `memory` otherwise.
//! - `NOTES_DATABASE_PATH` - SQLite file (default: user data dir `skynotes/notes.db`)
//!
//! Client side:
//! - `NOTES_SYNC_MODE` - `auto`, `local` or `remote` (default: `auto`)
//! - `NOTES_API_URL` - notes endpoint (default: `http://127.0.0.1:3000/api/notes`)
//! - `NOTES_REQUEST_TIMEOUT_MS` - remote request timeout (default: 3500)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default notes endpoint for local development.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api/notes";

/// Remote calls slower than this count as failed.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(3500);

/// Storage provider selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Memory,
    Sqlite,
    /// A name no backend answers to. Kept so the error can name it.
    Unsupported(String),
}

impl Provider {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Provider::Memory,
            "sqlite" => Provider::Sqlite,
            _ => Provider::Unsupported(value.to_string()),
        }
    }
}

/// Backend selection for the notes service.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub provider: Provider,
    pub database_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Load storage configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_env_with(None, None)
    }

    /// Environment configuration where explicit values take precedence.
    pub fn from_env_with(provider: Option<String>, database_path: Option<PathBuf>) -> Self {
        let provider = provider.or_else(|| std::env::var("NOTES_STORAGE_PROVIDER").ok());
        let database_path = database_path
            .or_else(|| std::env::var("NOTES_DATABASE_PATH").ok().map(PathBuf::from));
        Self::resolve(provider.as_deref(), database_path)
    }

    /// Apply the provider defaulting rules to explicit values.
    pub fn resolve(provider: Option<&str>, database_path: Option<PathBuf>) -> Self {
        let provider = match provider {
            Some(name) => Provider::parse(name),
            None if database_path.is_some() => Provider::Sqlite,
            None => Provider::Memory,
        };
        Self {
            provider,
            database_path,
        }
    }

    pub fn memory() -> Self {
        Self {
            provider: Provider::Memory,
            database_path: None,
        }
    }
}

/// How the sync client balances the local cache against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SyncMode {
    /// Cache only; never calls the remote service.
    Local,
    /// Always call the remote service and surface its failures.
    Remote,
    /// Prefer the remote service, fall back to the cache on any failure.
    #[default]
    Auto,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Local => "local",
            SyncMode::Remote => "remote",
            SyncMode::Auto => "auto",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SyncMode::Local),
            "remote" => Ok(SyncMode::Remote),
            "auto" => Ok(SyncMode::Auto),
            other => Err(format!("Invalid sync mode: {}", other)),
        }
    }
}

/// Sync client settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub api_url: String,
    pub timeout: Duration,
}

impl SyncConfig {
    /// Load sync configuration from environment variables.
    pub fn from_env() -> Self {
        let mode = match std::env::var("NOTES_SYNC_MODE") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using auto", e);
                SyncMode::Auto
            }),
            Err(_) => SyncMode::Auto,
        };

        let api_url =
            std::env::var("NOTES_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout = std::env::var("NOTES_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            mode,
            api_url,
            timeout,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::Auto,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
