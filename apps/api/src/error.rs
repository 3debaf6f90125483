//! Error types for the HTTP API.
//!
//! Every handler returns `ApiResult<T>`. Failures become the error envelope:
//!
//! ```json
//! {
//!   "status": "error",
//!   "message": "Validation failed",
//!   "data": null,
//!   "error": { "code": 400, "message": "...", "details": { "unit_name": "..." } }
//! }
//! ```
//!
//! Storage failures are logged and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use stockroom_core::CoreError;
use stockroom_db::DbError;
use tracing::{error, warn};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Business rule violations, passed through from core and db.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failures other than domain errors.
    #[error(transparent)]
    Db(DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => ApiError::Core(core),
            other => ApiError::Db(other),
        }
    }
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Core(CoreError::Unauthorized(message.into()))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err {
                CoreError::ValidationFailed(_)
                | CoreError::InvalidRole(_)
                | CoreError::InvalidImageFormat { .. }
                | CoreError::ImageTooLarge { .. }
                | CoreError::InvalidTransactionType(_)
                | CoreError::InvalidDateRange { .. }
                | CoreError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
                CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                CoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::Conflict { .. } | CoreError::InUse { .. } => StatusCode::CONFLICT,
                CoreError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Db(DbError::UniqueViolation { .. })
            | ApiError::Db(DbError::ForeignKeyViolation { .. }) => StatusCode::CONFLICT,
            ApiError::Db(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short headline for the envelope's top-level `message`.
    fn headline(&self) -> String {
        match self {
            ApiError::Core(err) => match err {
                CoreError::ValidationFailed(_) => "Validation failed".to_string(),
                CoreError::NotFound { entity, .. } => format!("{entity} not found"),
                CoreError::Conflict { entity, .. } => format!("{entity} already exists"),
                CoreError::InUse { entity, .. } => format!("{entity} cannot be deleted"),
                CoreError::InsufficientStock { .. } => "Insufficient stock".to_string(),
                CoreError::InvalidRole(_) => "Invalid role".to_string(),
                CoreError::InvalidImageFormat { .. } => "Invalid image format".to_string(),
                CoreError::ImageTooLarge { .. } => "Image too large".to_string(),
                CoreError::UploadFailed(_) => "Image upload failed".to_string(),
                CoreError::InvalidTransactionType(_) => "Invalid transaction type".to_string(),
                CoreError::InvalidDateRange { .. } => "Invalid date range".to_string(),
                CoreError::Unauthorized(_) => "Unauthorized".to_string(),
                CoreError::Forbidden { .. } => "Forbidden".to_string(),
            },
            ApiError::Db(DbError::UniqueViolation { .. }) => "Duplicate value".to_string(),
            ApiError::Db(DbError::ForeignKeyViolation { .. }) => {
                "Referenced record changed".to_string()
            }
            ApiError::Db(_) | ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Detail message shown to the client. Internal causes stay in the logs.
    fn client_message(&self) -> String {
        match self {
            ApiError::Core(CoreError::UploadFailed(_)) => "Image upload failed".to_string(),
            ApiError::Core(err) => err.to_string(),
            ApiError::Db(DbError::UniqueViolation { .. }) => {
                "A record with this value already exists".to_string()
            }
            ApiError::Db(DbError::ForeignKeyViolation { .. }) => {
                "A referenced record no longer exists or is still in use".to_string()
            }
            ApiError::Db(_) | ApiError::Internal(_) => {
                "An internal server error occurred".to_string()
            }
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::Core(CoreError::ValidationFailed(errors)) => json!(errors),
            ApiError::Core(CoreError::InsufficientStock {
                current_stock,
                required,
            }) => json!({ "current_stock": current_stock, "required": required }),
            ApiError::Core(CoreError::InUse {
                dependents, count, ..
            }) => json!({ "dependents": dependents.plural(), "count": count }),
            _ => Value::Null,
        }
    }
}

/// The `error` member of the envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub details: Value,
}

/// Error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
    pub data: Option<()>,
    pub error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let envelope = ErrorEnvelope {
            status: "error",
            message: self.headline(),
            data: None,
            error: ErrorBody {
                code: status.as_u16(),
                message: self.client_message(),
                details: self.details(),
            },
        };

        (status, Json(envelope)).into_response()
    }
}
