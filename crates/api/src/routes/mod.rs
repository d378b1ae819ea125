//! HTTP route handlers.

pub mod auth;
pub mod categories;
pub mod checkout;
pub mod extras;
pub mod health;
pub mod menu;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settings;
pub mod uploads;
pub mod variations;

use common::EntityId;
use serde::Serialize;

use crate::error::ApiError;

/// Body of responses that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub(crate) fn parse_id(id: &str) -> Result<EntityId, ApiError> {
    EntityId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
