use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INVALID_EXTENSION`, `IMAGE_NOT_FOUND`, `CONFLICT`,
    /// `PATH_ALLOCATION_FAILED`, `WRITE_FAILED`, `METADATA_PERSIST_FAILED`,
    /// `STORED_FILE_MISSING`, `STORE_UNAVAILABLE`.
    #[schema(example = "INVALID_EXTENSION")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid file extension. Allowed extensions are: jpg, png")]
    pub message: String,
}

/// Application-level error type.
///
/// Variants carrying a 5xx status log their detail server-side and return a
/// generic message to the client.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Upload filename has no extension, or one outside the allow-list.
    InvalidExtension(String),
    NotFound(String),
    /// Duplicate identifier on insert. Cannot happen with fresh v4 UUIDs,
    /// but the constraint violation is classified rather than left opaque.
    Conflict(String),
    /// The dated storage directory could not be created.
    PathAllocation(String),
    /// The blob write failed; the partial file has already been removed.
    Write(String),
    /// The metadata insert failed; the written blob has been removed.
    MetadataPersist(String),
    /// A record exists but its file does not. Integrity violation.
    StoredFileMissing(String),
    /// The database could not be reached.
    StoreUnavailable(String),
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
            AppError::InvalidExtension(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_EXTENSION",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "IMAGE_NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::PathAllocation(detail) => {
                tracing::error!("Path allocation failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "PATH_ALLOCATION_FAILED",
                        message: "Failed to allocate a storage path".into(),
                    },
                )
            }
            AppError::Write(detail) => {
                tracing::error!("Blob write failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "WRITE_FAILED",
                        message: "Failed to store the uploaded file".into(),
                    },
                )
            }
            AppError::MetadataPersist(detail) => {
                tracing::error!("Metadata insert failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "METADATA_PERSIST_FAILED",
                        message: "Failed to record image metadata".into(),
                    },
                )
            }
            AppError::StoredFileMissing(path) => {
                // Louder than a plain not-found: the record promises a file
                // that is not there.
                tracing::error!("Stored file missing for existing record: {}", path);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORED_FILE_MISSING",
                        message: "Stored file is missing".into(),
                    },
                )
            }
            AppError::StoreUnavailable(detail) => {
                tracing::error!("Database unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "STORE_UNAVAILABLE",
                        message: "Metadata store is unavailable".into(),
                    },
                )
            }
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
        if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
            return AppError::Conflict("Image identifier already exists".into());
        }
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                AppError::StoreUnavailable(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
