//! Storefront checkout and the gateway callback.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Redirect;
use payment::CheckoutFormInitialized;
use serde::Deserialize;
use store::Store;

use super::parse_id;
use crate::auth::Session;
use crate::error::ApiError;
use crate::extract::{ApiForm, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateCheckoutRequest {
    pub order_id: String,
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Raw `X-Forwarded-For` value. The checkout request keeps its first entry.
fn forwarded_for(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
}

/// POST /api/checkout/iyzico: opens a hosted checkout form for an order.
///
/// Only the order's owner or an admin may start a checkout.
#[tracing::instrument(skip(state, headers, body), fields(user_id = %session.user_id))]
pub async fn initiate<S: Store + Clone + 'static>(
    session: Session,
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<InitiateCheckoutRequest>,
) -> Result<Json<CheckoutFormInitialized>, ApiError> {
    let order_id = parse_id(&body.order_id)?;
    let order = state.orders.get_order(order_id).await?;
    if order.order.user_id != session.user_id && !session.is_admin() {
        return Err(ApiError::Forbidden(
            "You are not allowed to pay for this order".to_string(),
        ));
    }

    let form = state
        .checkout
        .initiate(order_id, body.callback_url, forwarded_for(&headers))
        .await?;
    Ok(Json(form))
}

#[derive(Debug, Deserialize)]
pub struct CallbackForm {
    #[serde(default)]
    pub token: Option<String>,
}

/// POST /api/checkout/iyzico/callback: the gateway posts the checkout token
/// here after the customer leaves the hosted form.
///
/// Always answers with a redirect to the storefront result page once a token
/// is present.
#[tracing::instrument(skip(state, form))]
pub async fn callback<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiForm(form): ApiForm<CallbackForm>,
) -> Result<Redirect, ApiError> {
    let token = form
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token is required".to_string()))?;

    let outcome = state.checkout.handle_callback(&token).await;
    Ok(Redirect::to(&outcome.redirect_url(state.checkout.app_url())))
}
