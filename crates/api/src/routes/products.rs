//! Admin product endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::ProductInput;
use serde::Serialize;
use store::{ProductDetail, ProductSummary, Store};

use super::{MessageResponse, parse_id};
use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductSummary>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub product: ProductDetail,
}

/// GET /api/admin/products
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state.products.list().await?;
    Ok(Json(ProductListResponse { products }))
}

/// POST /api/admin/products
#[tracing::instrument(skip(state, input))]
pub async fn create<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.products.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: Some("Product created"),
            product,
        }),
    ))
}

/// GET /api/admin/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.products.get(parse_id(&id)?).await?;
    Ok(Json(ProductResponse {
        message: None,
        product,
    }))
}

/// PATCH /api/admin/products/{id}
#[tracing::instrument(skip(state, input))]
pub async fn update<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.products.update(parse_id(&id)?, input).await?;
    Ok(Json(ProductResponse {
        message: Some("Product updated"),
        product,
    }))
}

/// DELETE /api/admin/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.products.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted",
    }))
}
