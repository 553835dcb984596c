use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::services::AuthError;

#[derive(Debug)]
pub enum ApiError {
    ValidationError { field: String, message: String },

    BadRequest(String),

    Forbidden(String),

    NotFound(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

/// Every error leaves the service as `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError { field, message } => {
                write!(f, "Validation error on {field}: {message}")
            }
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail, field) = match self {
            Self::ValidationError { field, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(field))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorBody { detail, field })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::Conflict("Resource already exists".to_string());
        }
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::BadRequest(err.to_string()),
            AuthError::Internal(msg) => Self::InternalError(msg),
            AuthError::InactiveUser
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::UserNotFound
            | AuthError::MissingApiKey
            | AuthError::InvalidApiKey
            | AuthError::ApiKeyExpired
            | AuthError::NotSuperuser
            | AuthError::Forbidden => Self::Forbidden(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Like the `From<anyhow::Error>` conversion, but a unique violation
    /// keeps the caller's wording.
    pub fn from_write(err: anyhow::Error, conflict: &str) -> Self {
        if crate::db::is_unique_violation(&err) {
            Self::Conflict(conflict.to_string())
        } else {
            Self::from(err)
        }
    }
}
