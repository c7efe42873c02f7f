//! Error types for the redirect service
//!
//! Two layers are kept apart:
//! - [`StoreError`] describes what went wrong talking to the embedded database
//! - [`AppError`] is what a request handler returns, and knows how to render
//!   itself as an HTTP response

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for Redirect Store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures of a single storage round trip.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("short id already exists: {0}")]
    DuplicateKey(String),
    #[error("short link not found: {0}")]
    NotFound(String),
    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    /// Reported by a transaction whose caller timed out before it could commit
    #[error("storage operation abandoned before commit")]
    Abandoned,
}

macro_rules! impl_from_redb {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(err: $err) -> Self {
                    StoreError::Unavailable(err.to_string())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidData(err.to_string())
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, empty or unusable long URL on creation
    #[error("{0}")]
    InvalidInput(String),

    /// The requested short id was never created
    #[error("Short URL not found")]
    NotFound,

    /// Storage failed, timed out, or no free short id could be minted
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored record cannot be served
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound,
            StoreError::InvalidData(detail) => AppError::Internal(detail),
            other => AppError::StorageUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::StorageUnavailable(detail) => {
                // Internal detail stays in the logs
                tracing::error!(error = %detail, "storage failure while handling request");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "corrupt data while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
