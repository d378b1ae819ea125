//! Registration and login.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use domain::RegistrationInput;
use serde::{Deserialize, Serialize};
use store::{Role, Store, User};

use crate::auth::session_cookie;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

/// POST /api/register: creates a customer account.
#[tracing::instrument(skip(state, input))]
pub async fn register<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<RegistrationInput>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user = state.users.register(input, Role::Customer).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created",
            user,
        }),
    ))
}

/// POST /api/create-admin: creates an admin account while bootstrapping is
/// enabled.
#[tracing::instrument(skip(state, input))]
pub async fn create_admin<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<RegistrationInput>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if !state.allow_admin_bootstrap {
        tracing::warn!("admin bootstrap attempted while disabled");
        return Err(ApiError::Forbidden(
            "Admin creation is disabled".to_string(),
        ));
    }
    let user = state.users.register(input, Role::Admin).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Admin account created",
            user,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/login: returns a session token in the body and as the
/// `session` cookie.
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub async fn login<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    let user = state.users.authenticate(&body.email, &body.password).await?;
    let token = state.sessions.issue(&user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "signed in");

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&token))]),
        Json(LoginResponse { token, user }),
    ))
}
