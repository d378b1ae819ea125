//! Body extractors whose rejections use the API error shape.
//!
//! axum's own `Json` and `Form` reject with plain-text 400/415/422
//! responses; these wrappers turn every rejection into a 400 with an
//! `{"error": ...}` body like the rest of the API.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// URL-encoded form body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);
