//! Domain error types.

use store::StoreError;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed a business rule.
    #[error("{0}")]
    Validation(String),

    /// The addressed entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The write collides with existing data (taken slug or email).
    #[error("{0}")]
    Conflict(String),

    /// Email and password did not match an account.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// A blocking task (password hashing) did not run to completion.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { constraint } => {
                DomainError::Conflict(format!("Value already in use ({constraint})"))
            }
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            other => DomainError::Store(other),
        }
    }
}

impl From<ValidationErrors> for DomainError {
    /// Reports the first failing field in name order, so the message is
    /// stable across runs.
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(
            first_message(&errors).unwrap_or_else(|| "Invalid input".to_string()),
        )
    }
}

fn first_message(errors: &ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(field, _)| **field);

    fields.into_iter().find_map(|(field, kind)| match kind {
        ValidationErrorsKind::Field(list) => list.first().map(|e| match &e.message {
            Some(message) => message.to_string(),
            None => format!("{field} is invalid"),
        }),
        ValidationErrorsKind::Struct(inner) => first_message(inner),
        ValidationErrorsKind::List(items) => items.values().find_map(|inner| first_message(inner)),
    })
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
