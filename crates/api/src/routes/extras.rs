//! Admin extra endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::ExtraInput;
use serde::Serialize;
use store::{Extra, ExtraDetail, Store};

use super::{MessageResponse, parse_id};
use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ExtraListResponse {
    pub extras: Vec<Extra>,
}

#[derive(Serialize)]
pub struct ExtraDetailResponse {
    pub extra: ExtraDetail,
}

#[derive(Serialize)]
pub struct ExtraResponse {
    pub message: &'static str,
    pub extra: Extra,
}

/// GET /api/admin/extras
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ExtraListResponse>, ApiError> {
    let extras = state.extras.list().await?;
    Ok(Json(ExtraListResponse { extras }))
}

/// POST /api/admin/extras
#[tracing::instrument(skip(state, input))]
pub async fn create<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<ExtraInput>,
) -> Result<(StatusCode, Json<ExtraResponse>), ApiError> {
    let extra = state.extras.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ExtraResponse {
            message: "Extra created",
            extra,
        }),
    ))
}

/// GET /api/admin/extras/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ExtraDetailResponse>, ApiError> {
    let extra = state.extras.get(parse_id(&id)?).await?;
    Ok(Json(ExtraDetailResponse { extra }))
}

/// PATCH /api/admin/extras/{id}
#[tracing::instrument(skip(state, input))]
pub async fn update<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ExtraInput>,
) -> Result<Json<ExtraResponse>, ApiError> {
    let extra = state.extras.update(parse_id(&id)?, input).await?;
    Ok(Json(ExtraResponse {
        message: "Extra updated",
        extra,
    }))
}

/// DELETE /api/admin/extras/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.extras.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Extra deleted",
    }))
}
