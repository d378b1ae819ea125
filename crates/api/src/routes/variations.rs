//! Admin variation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::VariationInput;
use serde::Serialize;
use store::{Store, VariationDetail, VariationWithOptions};

use super::{MessageResponse, parse_id};
use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct VariationListResponse {
    pub variations: Vec<VariationWithOptions>,
}

#[derive(Serialize)]
pub struct VariationDetailResponse {
    pub variation: VariationDetail,
}

#[derive(Serialize)]
pub struct VariationResponse {
    pub message: &'static str,
    pub variation: VariationWithOptions,
}

/// GET /api/admin/variations
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<VariationListResponse>, ApiError> {
    let variations = state.variations.list().await?;
    Ok(Json(VariationListResponse { variations }))
}

/// POST /api/admin/variations
#[tracing::instrument(skip(state, input))]
pub async fn create<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<VariationInput>,
) -> Result<(StatusCode, Json<VariationResponse>), ApiError> {
    let variation = state.variations.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(VariationResponse {
            message: "Variation created",
            variation,
        }),
    ))
}

/// GET /api/admin/variations/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<VariationDetailResponse>, ApiError> {
    let variation = state.variations.get(parse_id(&id)?).await?;
    Ok(Json(VariationDetailResponse { variation }))
}

/// PATCH /api/admin/variations/{id}
///
/// Options carrying an `id` are updated, options without one are created and
/// stored options left out of the body are deleted.
#[tracing::instrument(skip(state, input))]
pub async fn update<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<VariationInput>,
) -> Result<Json<VariationResponse>, ApiError> {
    let variation = state.variations.update(parse_id(&id)?, input).await?;
    Ok(Json(VariationResponse {
        message: "Variation updated",
        variation,
    }))
}

/// DELETE /api/admin/variations/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.variations.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Variation deleted",
    }))
}
