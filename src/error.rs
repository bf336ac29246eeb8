//! Error types for the pager
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error ==
/// Failure reported by a page fetch.
///
/// Loaders never propagate this to their callers; it is recorded as the
/// loader's `last_error` and the failed page stays retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (connection refused, reset, offline)
    #[error("{0}")]
    Network(String),

    /// The upstream answered with a non-success status
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// A single attempt exceeded its deadline (milliseconds)
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The requested page number is outside what the source serves
    #[error("invalid page: {0}")]
    InvalidPage(u32),

    /// The response could not be decoded into items
    #[error("failed to decode page: {0}")]
    Decode(String),
}

impl FetchError {
    /// Shorthand for a [`FetchError::Network`] failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Upstream { status, .. } => *status >= 500 || *status == 429,
            FetchError::InvalidPage(_) | FetchError::Decode(_) => false,
        }
    }
}

// == Storage Error ==
/// Failure of a durable key-value backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,

    /// The blocking task running the storage call panicked or was cancelled
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// == Api Error ==
/// Error type for the demo HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
