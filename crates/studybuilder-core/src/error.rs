//! Core error types for studybuilder-core.
//!
//! The hierarchy mirrors the failure classes of the scheduling core:
//! malformed input is reported synchronously, remote failures are carried
//! through request state, and wiring mistakes (unknown action tags, a
//! context used outside its provider) are surfaced as hard errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studybuilder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Duration token errors
    #[error("Duration error: {0}")]
    Duration(#[from] DurationError),

    /// Remote API errors
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Shared context misuse
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced while parsing a duration token such as `"3D"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration token")]
    Empty,

    /// Token is not `<non-negative integer><unit code>` in canonical form.
    #[error("malformed duration token '{token}'")]
    Malformed { token: String },

    #[error("unknown duration unit '{code}'")]
    UnknownUnit { code: String },

    #[error("duration count out of range in '{token}'")]
    Overflow { token: String },
}

/// Failures of the remote study/schedule service.
///
/// Kept `Clone` so it can live inside an [`crate::request::AsyncState`]
/// snapshot handed to observers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("remote service is offline")]
    Offline,
}

/// Misuse of the shared study context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The provider that owned the store has been dropped.
    #[error("study info context used outside of its provider")]
    OutsideProvider,

    #[error("unhandled action type: {tag}")]
    UnknownAction { tag: String },

    #[error("action {tag} is missing its {field} payload")]
    MissingPayload { tag: String, field: &'static str },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors raised by editor and launch operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no study is loaded in the editor")]
    NotLoaded,

    #[error("session '{id}' not found in the current schedule")]
    UnknownSession { id: String },

    #[error("schedule belongs to study '{found}', expected '{expected}'")]
    StudyMismatch { expected: String, found: String },

    #[error("launch requirements incomplete: {}", pending.join(", "))]
    IncompleteLaunch { pending: Vec<String> },

    #[error("launch step {index} out of range (steps: {len})")]
    InvalidStep { index: usize, len: usize },
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
