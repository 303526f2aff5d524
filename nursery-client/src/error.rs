//! Client error types

use shared::PolicyViolation;
use thiserror::Error;

/// Errors talking to the remote data service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error body returned by the backend (PostgREST format)
    #[error("{message}")]
    Api {
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Backend error with only a message
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Tag collection store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Load or reload failed; not retried
    #[error("Failed to load tags: {0}")]
    RemoteFetch(#[source] ClientError),

    /// Mutation (create/update/delete) rejected by the backend
    #[error("Tag update failed: {0}")]
    RemoteWrite(#[source] ClientError),

    #[error("No zone has been loaded")]
    NoZoneLoaded,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a bulk status change is refused before any side effect
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Nothing is selected")]
    EmptySelection,

    /// The selection referenced tags no longer loaded; it has been cleared
    #[error("{stale_count} selected tag(s) are no longer visible; selection cleared")]
    StaleSelection { stale_count: usize },

    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    /// Another bulk run is still in flight on this orchestrator
    #[error("A bulk status change is already in progress")]
    Busy,

    /// The user declined the confirmation prompt
    #[error("Status change cancelled")]
    Cancelled,
}

pub type TransitionResult<T> = Result<T, TransitionError>;
