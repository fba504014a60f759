//! Error types shared across the service and their HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

use crate::records::validation::ValidationErrors;
use crate::render::RenderError;
use crate::ErrorResponse;

/// Failures of the sequence store or the record store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored {kind} record {id} is unreadable: {reason}")]
    Corrupt {
        kind: &'static str,
        id: String,
        reason: String,
    },
    #[error("failed to encode {kind} record: {reason}")]
    Encode { kind: &'static str, reason: String },
    #[error("counter value {0} is out of range")]
    CounterRange(i64),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A unique constraint rejected the write.
    #[error("{kind} with {field} '{value}' already exists")]
    Conflict {
        kind: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Error surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::Storage(_) => "StorageError",
            Self::Validation(_) => "ValidationError",
            Self::NotFound { .. } => "NotFound",
            Self::Render(RenderError::Asset(_)) => "AssetLoadError",
            Self::Render(_) => "RenderError",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}: {}", self.error_type(), self);
        } else {
            log::debug!("{}: {}", self.error_type(), self);
        }

        let mut body = ErrorResponse::new(self.error_type(), &self.to_string());
        if let Self::Validation(errors) = self {
            body.fields = errors.fields();
        }
        HttpResponse::build(status).json(body)
    }
}
