use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `NOT_FOUND`, `INCOMPLETE_UPLOAD`, `INTEGRITY_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid camera type: side")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// The transport was interrupted before all declared bytes arrived.
    IncompleteUpload(String),
    /// A record references a blob that no longer exists.
    Integrity(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::IncompleteUpload(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INCOMPLETE_UPLOAD",
                    message: msg,
                },
            ),
            AppError::Integrity(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "INTEGRITY_ERROR",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => AppError::NotFound(format!("Blob '{id}' not found")),
            StorageError::MissingChunk { .. } | StorageError::LengthMismatch { .. } => {
                tracing::warn!("Storage integrity violation: {err}");
                AppError::Integrity(err.to_string())
            }
            StorageError::IncompleteUpload { .. } => AppError::IncompleteUpload(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
