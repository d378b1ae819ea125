//! Customer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::PlaceOrderInput;
use serde::Serialize;
use store::{OrderDetail, Store};

use super::parse_id;
use crate::auth::Session;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OrderResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub order: OrderDetail,
}

/// POST /api/orders: places a `Pending` order for the signed-in user.
#[tracing::instrument(skip(state, input), fields(user_id = %session.user_id))]
pub async fn create<S: Store + Clone + 'static>(
    session: Session,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<PlaceOrderInput>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.orders.place_order(session.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: Some("Order placed"),
            order,
        }),
    ))
}

/// GET /api/orders/{id}: visible to the owner and to admins.
#[tracing::instrument(skip(state), fields(user_id = %session.user_id))]
pub async fn get<S: Store + Clone + 'static>(
    session: Session,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(parse_id(&id)?).await?;
    if order.order.user_id != session.user_id && !session.is_admin() {
        return Err(ApiError::Forbidden(
            "You are not allowed to view this order".to_string(),
        ));
    }
    Ok(Json(OrderResponse {
        message: None,
        order,
    }))
}
