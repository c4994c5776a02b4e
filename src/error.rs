//! Structured errors for the task endpoint.
//!
//! Every failure the handler can produce becomes an [`ApiError`], which knows
//! its HTTP status and renders itself as the failure envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::types::Envelope;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Routing
    MethodNotAllowed,

    // Store failures
    DatabaseError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error for endpoint responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message).with_field(field)
    }

    pub fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, message).with_field(field)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(ErrorCode::MethodNotAllowed, "Method not allowed")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Validation failures are the caller's fault; everything else is ours.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Store functions return anyhow errors; anything that is not already an
// ApiError is a store failure.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(Envelope::<()>::failure(self.message))).into_response()
    }
}

/// Result type for endpoint operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
