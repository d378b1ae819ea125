//! Admin category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::CategoryInput;
use serde::Serialize;
use store::{Category, Store};

use super::{MessageResponse, parse_id};
use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub category: Category,
}

/// GET /api/admin/categories
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = state.categories.list().await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// POST /api/admin/categories
#[tracing::instrument(skip(state, input))]
pub async fn create<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = state.categories.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: Some("Category created"),
            category,
        }),
    ))
}

/// GET /api/admin/categories/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state.categories.get(parse_id(&id)?).await?;
    Ok(Json(CategoryResponse {
        message: None,
        category,
    }))
}

/// PUT /api/admin/categories/{id}
#[tracing::instrument(skip(state, input))]
pub async fn update<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state.categories.update(parse_id(&id)?, input).await?;
    Ok(Json(CategoryResponse {
        message: Some("Category updated"),
        category,
    }))
}

/// DELETE /api/admin/categories/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.categories.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Category deleted",
    }))
}
