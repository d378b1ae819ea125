//! Payment error types.

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur while talking to the gateway or resolving a checkout.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Iyzico credentials are missing from the settings.
    #[error("Iyzico API credentials are not configured")]
    NotConfigured,

    /// The request cannot be sent as given.
    #[error("{0}")]
    Validation(String),

    /// The gateway answered with a non-success status.
    #[error("{0}")]
    Gateway(String),

    /// The gateway could not be reached.
    #[error("Gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a body we could not read.
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl PaymentError {
    pub fn validation(message: impl Into<String>) -> Self {
        PaymentError::Validation(message.into())
    }
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
