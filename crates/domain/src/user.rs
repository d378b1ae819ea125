//! Account registration and password checks.

use std::sync::LazyLock;

use common::EntityId;
use serde::Deserialize;
use store::{NewUser, Role, Store, StoreError, User};
use validator::Validate;

use crate::error::{DomainError, Result};
use crate::validation::{optional_text, required};

/// bcrypt work factor for stored password hashes.
pub const PASSWORD_COST: u32 = 10;

/// Hash checked when no account matches, so unknown emails cost the same
/// bcrypt round as wrong passwords.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("no-such-account", PASSWORD_COST).ok());

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegistrationInput {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    /// bcrypt ignores everything past 72 bytes.
    #[validate(length(max = 72, message = "Password must be at most 72 characters"))]
    pub password: Option<String>,
}

pub struct UserService<S: Store> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an account with `role`. The email must be well formed and unused.
    #[tracing::instrument(skip(self, input))]
    pub async fn register(&self, input: RegistrationInput, role: Role) -> Result<User> {
        const MISSING: &str = "Name, email and password are required";
        let input = RegistrationInput {
            name: optional_text(input.name),
            email: optional_text(input.email),
            password: input.password.filter(|p| !p.is_empty()),
        };
        let name = required(input.name.as_deref(), MISSING)?;
        let email = required(input.email.as_deref(), MISSING)?;
        let password = input
            .password
            .clone()
            .ok_or_else(|| DomainError::validation(MISSING))?;
        input.validate()?;

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_COST)).await??;
        let user = self
            .store
            .insert_user(NewUser {
                name,
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation { .. } => email_taken(),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }

    /// Returns the account matching `email` and `password`.
    ///
    /// A stored hash bcrypt cannot read is an error, not a failed login.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self.store.get_user_by_email(email.trim()).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let password = password.to_string();

        let verified = tokio::task::spawn_blocking(
            move || -> std::result::Result<bool, bcrypt::BcryptError> {
                match stored_hash {
                    Some(hash) => bcrypt::verify(password, &hash),
                    None => {
                        if let Some(dummy) = DUMMY_HASH.as_deref() {
                            bcrypt::verify(password, dummy)?;
                        }
                        Ok(false)
                    }
                }
            },
        )
        .await??;

        match user {
            Some(user) if verified => Ok(user),
            _ => Err(DomainError::InvalidCredentials),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: EntityId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }
}

fn email_taken() -> DomainError {
    DomainError::Conflict("This email address is already in use".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryStore, UserStore};

    fn registration(email: &str) -> RegistrationInput {
        RegistrationInput {
            name: Some("Ayşe Yılmaz".into()),
            email: Some(email.into()),
            password: Some("hunter22".into()),
        }
    }

    #[tokio::test]
    async fn register_hashes_password() {
        let service = UserService::new(InMemoryStore::new());
        let user = service
            .register(registration("ayse@example.com"), Role::Customer)
            .await
            .unwrap();
        assert_ne!(user.password_hash, "hunter22");
        assert!(user.password_hash.starts_with("$2"));
        assert_eq!(user.role, Role::Customer);
    }

    #[tokio::test]
    async fn register_rejects_bad_email_and_duplicates() {
        let service = UserService::new(InMemoryStore::new());
        let err = service
            .register(registration("not-an-email"), Role::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        service
            .register(registration("ayse@example.com"), Role::Customer)
            .await
            .unwrap();
        let err = service
            .register(registration("ayse@example.com"), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let service = UserService::new(InMemoryStore::new());

        let err = service
            .register(registration("ayse.example.com"), Role::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m == "Enter a valid email address"));

        let mut long_password = registration("ayse@example.com");
        long_password.password = Some("x".repeat(73));
        let err = service.register(long_password, Role::Customer).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("72")));

        let mut missing = registration("ayse@example.com");
        missing.password = Some(String::new());
        let err = service.register(missing, Role::Customer).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("required")));

        let user = service
            .register(registration("  ayse@example.com "), Role::Customer)
            .await
            .unwrap();
        assert_eq!(user.email, "ayse@example.com");
    }

    #[tokio::test]
    async fn unreadable_stored_hash_is_an_error() {
        let store = InMemoryStore::new();
        store
            .insert_user(NewUser {
                name: "Legacy".into(),
                email: "legacy@example.com".into(),
                password_hash: "plain-text".into(),
                role: Role::Customer,
            })
            .await
            .unwrap();

        let err = UserService::new(store)
            .authenticate("legacy@example.com", "plain-text")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PasswordHash(_)));
    }

    #[test]
    fn dummy_hash_never_matches() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        assert!(!bcrypt::verify("hunter22", dummy).unwrap());
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let service = UserService::new(InMemoryStore::new());
        let user = service
            .register(registration("ayse@example.com"), Role::Admin)
            .await
            .unwrap();

        let found = service
            .authenticate("ayse@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        assert!(matches!(
            service.authenticate("ayse@example.com", "wrong").await,
            Err(DomainError::InvalidCredentials)
        ));
        assert!(matches!(
            service.authenticate("nobody@example.com", "hunter22").await,
            Err(DomainError::InvalidCredentials)
        ));
    }
}
