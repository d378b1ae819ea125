//! Signed session tokens and the extractors that check them.
//!
//! A token is `base64url(claims) "." base64url(hmac_sha256(key, claims))`
//! where `claims` is the JSON of [`SessionClaims`]. Clients send it either as
//! `Authorization: Bearer <token>` or in the `session` cookie.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use common::EntityId;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use store::{Role, User};

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "session";

/// Sessions last 30 days.
pub const SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: EntityId,
    pub role: String,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

/// Key material for signing and checking session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    key: Arc<[u8]>,
}

impl SessionKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Arc::from(secret.as_ref()),
        }
    }

    /// A random key. Tokens signed with it die with the process.
    pub fn random() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(key)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("hmac accepts any key length"),
        }
    }

    /// Issues a token for `user` valid for [`SESSION_TTL_DAYS`].
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let claims = SessionClaims {
            sub: user.id,
            role: user.role.to_string(),
            exp: (Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, ApiError> {
        let payload =
            serde_json::to_vec(claims).map_err(|e| ApiError::Internal(e.to_string()))?;
        let mut mac = self.mac();
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Returns the claims of a well-signed, unexpired token.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let (payload, signature) = token.trim().split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature).ok()?;

        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        (claims.exp > Utc::now().timestamp()).then_some(claims)
    }
}

/// Builds the `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_TTL_DAYS * 24 * 60 * 60
    )
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: EntityId,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::Unauthorized("You must be signed in".to_string());
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(unauthorized)?;
        let claims = SessionKeys::from_ref(state)
            .verify(token)
            .ok_or_else(unauthorized)?;
        // Role names compare case-insensitively.
        let role = claims.role.parse::<Role>().map_err(|_| unauthorized())?;
        Ok(Session {
            user_id: claims.sub,
            role,
        })
    }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession(pub Session);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            tracing::warn!(user_id = %session.user_id, "admin route refused");
            return Err(ApiError::Forbidden(
                "You are not allowed to perform this action".to_string(),
            ));
        }
        Ok(AdminSession(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn user(role: Role) -> User {
        User {
            id: EntityId::new(),
            name: "Test".into(),
            email: "t@example.com".into(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    fn parts(header: (&str, &str)) -> Parts {
        let (parts, _) = Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn issued_token_verifies() {
        let keys = SessionKeys::new("secret");
        let admin = user(Role::Admin);
        let claims = keys.verify(&keys.issue(&admin).unwrap()).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, "ADMIN");
    }

    #[test]
    fn tampered_or_foreign_tokens_fail() {
        let keys = SessionKeys::new("secret");
        let token = keys.issue(&user(Role::Customer)).unwrap();

        assert!(SessionKeys::new("other").verify(&token).is_none());

        let forged = SessionClaims {
            sub: EntityId::new(),
            role: "ADMIN".into(),
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let signature = token.split_once('.').unwrap().1;
        assert!(keys.verify(&format!("{forged_payload}.{signature}")).is_none());
        assert!(keys.verify("garbage").is_none());
    }

    #[test]
    fn expired_token_fails() {
        let keys = SessionKeys::new("secret");
        let token = keys
            .sign(&SessionClaims {
                sub: EntityId::new(),
                role: "ADMIN".into(),
                exp: Utc::now().timestamp() - 1,
            })
            .unwrap();
        assert!(keys.verify(&token).is_none());
    }

    #[tokio::test]
    async fn session_from_cookie_with_lowercase_role() {
        let keys = SessionKeys::new("secret");
        let id = EntityId::new();
        let token = keys
            .sign(&SessionClaims {
                sub: id,
                role: "admin".into(),
                exp: i64::MAX,
            })
            .unwrap();
        let mut parts = parts(("cookie", &format!("theme=dark; session={token}")));

        let AdminSession(session) = AdminSession::from_request_parts(&mut parts, &keys)
            .await
            .unwrap();
        assert_eq!(session.user_id, id);
    }

    #[tokio::test]
    async fn customer_is_forbidden_from_admin() {
        let keys = SessionKeys::new("secret");
        let token = keys.issue(&user(Role::Customer)).unwrap();
        let mut parts = parts(("authorization", &format!("Bearer {token}")));

        let err = AdminSession::from_request_parts(&mut parts, &keys)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let keys = SessionKeys::new("secret");
        let mut parts = parts(("accept", "application/json"));
        let err = Session::from_request_parts(&mut parts, &keys).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
