//! Admin payment operations: credential test, cancel and refund.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Money;
use payment::IyzicoConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use store::Store;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Admin forms post the sandbox flag either as a JSON bool or as the string
/// `"true"`.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
        None => false,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub sandbox: bool,
}

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub sandbox: bool,
}

/// POST /api/admin/payment/test-iyzico: checks credentials before they are
/// saved in the settings.
#[tracing::instrument(skip(state, body), fields(sandbox = body.sandbox))]
pub async fn test_connection<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<TestConnectionRequest>,
) -> Result<Json<TestConnectionResponse>, ApiError> {
    let api_key = body.api_key.trim();
    let secret_key = body.secret_key.trim();
    if api_key.is_empty() || secret_key.is_empty() {
        return Err(ApiError::BadRequest(
            "API key and secret key are required".to_string(),
        ));
    }

    let config = IyzicoConfig::new(api_key, secret_key, body.sandbox);
    if !state.checkout.test_connection(&config).await {
        return Err(ApiError::BadRequest(
            "Could not connect to Iyzico with these credentials".to_string(),
        ));
    }

    Ok(Json(TestConnectionResponse {
        message: "Iyzico connection successful",
        status: "success",
        sandbox: body.sandbox,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelPaymentRequest {
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// POST /api/admin/payments/cancel: returns the gateway response as is.
#[tracing::instrument(skip(state, body))]
pub async fn cancel<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<CancelPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = state
        .checkout
        .cancel(&body.payment_id, body.ip.as_deref(), body.description)
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentRequest {
    #[serde(default)]
    pub payment_transaction_id: String,
    /// Amount in lira, like every other price in the API.
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// POST /api/admin/payments/refund: returns the gateway response as is.
#[tracing::instrument(skip(state, body))]
pub async fn refund<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<RefundPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = state
        .checkout
        .refund(
            &body.payment_transaction_id,
            body.price,
            body.ip.as_deref(),
            body.description,
        )
        .await?;
    Ok(Json(response))
}
