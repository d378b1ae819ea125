//! API error types with HTTP response mapping.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use payment::PaymentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// No valid session.
    Unauthorized(String),
    /// Session present but lacking the required role.
    Forbidden(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Payment gateway or checkout error.
    Payment(PaymentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Internal(msg) => internal(msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: String) -> (StatusCode, String) {
    tracing::error!(error = %msg, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal error occurred".to_string(),
    )
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(_) | DomainError::Conflict(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
        DomainError::PasswordHash(_) | DomainError::Task(_) | DomainError::Store(_) => {
            internal(err.to_string())
        }
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match err {
        PaymentError::Domain(inner) => domain_error_to_response(inner),
        PaymentError::NotConfigured | PaymentError::Validation(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        PaymentError::Gateway(_) | PaymentError::Transport(_) | PaymentError::InvalidResponse(_) => {
            tracing::warn!(error = %err, "payment gateway failure");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        PaymentError::Serialization(_) => internal(err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(format!("Invalid form body: {}", rejection.body_text()))
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}
