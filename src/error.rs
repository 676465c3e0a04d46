// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique constraint was violated (e.g. a username already taken).
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The backend itself failed (connection, query, transaction).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // Postgres unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return StorageError::Duplicate(db_err.message().to_string());
            }
        }
        StorageError::Backend(err.to_string())
    }
}

/// Errors of the quiz attempt engine.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("quiz requires {required} questions but only {available} are available")]
    InsufficientQuestions { required: usize, available: usize },

    #[error("an attempt needs at least one question")]
    NoQuestions,

    #[error("time limit must be positive, got {0}s")]
    InvalidTimeLimit(i64),

    #[error("quiz has an invalid question count {0}")]
    InvalidQuestionCount(i32),

    #[error("attempt is over")]
    SessionTerminal,

    #[error("time limit expired, attempt is over")]
    TimeExpired,

    #[error("invalid option '{0}', expected one of A, B, C, D")]
    InvalidOption(String),

    #[error("question {0} is not part of this attempt")]
    UnknownQuestion(i64),

    #[error("question {0} has already been answered")]
    AlreadyAnswered(i64),

    #[error("attempt is still active and cannot be scored yet")]
    NotTerminal,

    #[error("inconsistent attempt result: {0}")]
    InvalidResult(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username, answer already recorded)
    Conflict(String),

    // 410 Gone (attempt already finished or timed out)
    Gone(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(msg) => AppError::Conflict(msg),
            StorageError::Backend(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// Maps engine errors onto HTTP semantics.
impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        let msg = err.to_string();
        match err {
            QuizError::NotFound(_) => AppError::NotFound(msg),
            QuizError::InsufficientQuestions { .. }
            | QuizError::NoQuestions
            | QuizError::AlreadyAnswered(_)
            | QuizError::NotTerminal => AppError::Conflict(msg),
            QuizError::SessionTerminal | QuizError::TimeExpired => AppError::Gone(msg),
            QuizError::InvalidOption(_)
            | QuizError::UnknownQuestion(_)
            | QuizError::InvalidTimeLimit(_) => AppError::BadRequest(msg),
            QuizError::InvalidQuestionCount(_) | QuizError::InvalidResult(_) => {
                AppError::InternalServerError(msg)
            }
            QuizError::Storage(inner) => AppError::from(inner),
        }
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from(StorageError::from(err))
    }
}

impl From<crate::report::ReportError> for AppError {
    fn from(err: crate::report::ReportError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
