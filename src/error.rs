use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::models::Role;
use crate::session::Phase;

/// Failures reported by the roster source, the attendance store or the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Request timed out")]
    Timeout,
}

impl BackendError {
    /// Transport-level failures that may succeed when repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Unavailable(_) | BackendError::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Failed to load roster: {0}")]
    LoadFailure(BackendError),

    #[error("Commit conflict: {0}")]
    CommitConflict(String),

    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    #[error("Transient network failure: {0}")]
    TransientNetworkFailure(String),

    #[error("{operation} is not allowed while {phase}")]
    PhaseRejected {
        operation: &'static str,
        phase: Phase,
    },

    #[error("A commit is already in flight")]
    CommitInFlight,

    #[error("Unknown student: {0}")]
    UnknownStudent(String),

    #[error("Commit result does not belong to the pending commit")]
    StaleCommit,
}

impl SessionError {
    pub(crate) fn from_commit_failure(err: BackendError) -> Self {
        match err {
            BackendError::Conflict(msg) | BackendError::NotFound(msg) => {
                SessionError::CommitConflict(msg)
            }
            BackendError::Validation(msg) => SessionError::ValidationFailure(msg),
            transient @ (BackendError::Unavailable(_) | BackendError::Timeout) => {
                SessionError::TransientNetworkFailure(transient.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Enter a valid 8-digit Student ID or 5-digit Faculty ID")]
    UnrecognizedId,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Signed in as {actual:?}, {required:?} required")]
    WrongRole { required: Role, actual: Role },

    #[error("Login failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Server-side error, rendered as a JSON `ErrorResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Migrate(e) => {
                error!("migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
