//! Admin settings endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::SettingsPatch;
use serde::Serialize;
use store::{Settings, Store};

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub settings: Settings,
}

/// GET /api/admin/settings: returns the settings, creating defaults on first use.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.settings.get().await?;
    Ok(Json(SettingsResponse {
        message: None,
        settings,
    }))
}

/// PUT /api/admin/settings: partial update; absent fields keep their value.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    ApiJson(patch): ApiJson<SettingsPatch>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.settings.update(patch).await?;
    Ok(Json(SettingsResponse {
        message: Some("Settings updated"),
        settings,
    }))
}
