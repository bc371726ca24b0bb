//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing, malformed, expired or unknown credentials. Deliberately
    /// carries no detail.
    #[error("Unauthorized")]
    Unauthorized,

    /// Wrong login identifier or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Stubbed customer transfers end here after passing validation
    #[error("Service temporarily unavailable")]
    ServiceUnavailable {
        message: String,
        details: serde_json::Value,
    },

    // Server errors (5xx)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hashing(msg) => AppError::Internal(msg),
            other => {
                tracing::debug!(reason = %other, "Authentication rejected");
                AppError::Unauthorized
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }

            // 401 Unauthorized
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),

            // 404 Not Found
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, "not_found", format!("{} not found", what))
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => {
                let status = match domain_err {
                    DomainError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
                    DomainError::SystemAccount => StatusCode::FORBIDDEN,
                    e if e.is_conflict_error() => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, domain_err.code(), domain_err.to_string())
            }

            // 503 Service Unavailable
            AppError::ServiceUnavailable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                self.to_string(),
            ),

            AppError::Store(store_err) => match store_err {
                StoreError::Conflict("email") => (
                    StatusCode::CONFLICT,
                    DomainError::DuplicateEmail.code(),
                    DomainError::DuplicateEmail.to_string(),
                ),
                StoreError::Conflict(field) => (
                    StatusCode::CONFLICT,
                    "conflict",
                    format!("Duplicate {}", field),
                ),
                StoreError::CustomerNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "customer_not_found",
                    format!("Customer not found: {}", id),
                ),
                StoreError::InsufficientFunds(_) => (
                    StatusCode::BAD_REQUEST,
                    "insufficient_balance",
                    "Insufficient balance".to_string(),
                ),
                StoreError::Database(e) => {
                    tracing::error!("Database error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
                StoreError::MissingSystemRecord(what) => {
                    tracing::error!("System record missing: {}", what);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, error) = self.parts();

        let (message, details) = match self {
            AppError::ServiceUnavailable { message, details } => (Some(message), Some(details)),
            _ => (None, None),
        };

        let body = ErrorResponse {
            success: false,
            error,
            error_code: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
