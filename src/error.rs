//! Error types for the library service

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NotFound = 4,
    BadValue = 5,
    Duplicate = 6,
    PaymentPending = 7,
    OutOfStock = 8,
    InvalidTransition = 9,
}

/// One `{ field: message }` entry of a validation failure
pub type FieldErrors = Vec<BTreeMap<String, String>>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("payment is pending")]
    PaymentPending,

    #[error("book is out of stock")]
    OutOfStock,

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut entry = BTreeMap::new();
        entry.insert(field.to_string(), message.into());
        AppError::Validation(vec![entry])
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

/// Error response body for request validation failures
#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationErrorResponse {
    pub code: u32,
    pub error: String,
    #[schema(value_type = Vec<Object>)]
    pub message: FieldErrors,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(fields) => {
                let body = Json(ValidationErrorResponse {
                    code: ErrorCode::BadValue as u32,
                    error: format!("{:?}", ErrorCode::BadValue),
                    message: fields,
                });
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg),
            e @ AppError::PaymentPending => {
                (StatusCode::BAD_REQUEST, ErrorCode::PaymentPending, e.to_string())
            }
            e @ AppError::OutOfStock => (StatusCode::CONFLICT, ErrorCode::OutOfStock, e.to_string()),
            AppError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, ErrorCode::InvalidTransition, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
