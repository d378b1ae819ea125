//! Public storefront menu.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::Menu;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/menu
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Menu>, ApiError> {
    Ok(Json(state.menu.menu().await?))
}
