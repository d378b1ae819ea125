//! File upload endpoints.
//!
//! Files are written below the configured upload root and served from
//! `/uploads/...` by the static file server in front of the API.

use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use serde::Serialize;
use store::Store;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::state::AppState;

/// Accepted content types and the size cap for one kind of upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadRule {
    /// `(content type, file extension)` pairs.
    pub accepted: &'static [(&'static str, &'static str)],
    pub max_bytes: usize,
}

/// Logo, favicon and category icons.
pub const BRANDING: UploadRule = UploadRule {
    accepted: &[("image/png", "png"), ("image/svg+xml", "svg")],
    max_bytes: 1024 * 1024,
};

/// Product and content images.
pub const MEDIA: UploadRule = UploadRule {
    accepted: &[
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
    ],
    max_bytes: 5 * 1024 * 1024,
};

/// Largest request body the upload routes read.
pub const BODY_LIMIT: usize = 8 * 1024 * 1024;

const BRANDING_FIELDS: [&str; 3] = ["logo", "favicon", "icon"];
const DEFAULT_MEDIA_TYPE: &str = "general";

impl UploadRule {
    /// Checks a file against the rule and returns the extension to store it
    /// under.
    pub fn check(&self, field: &str, content_type: &str, len: usize) -> Result<&'static str, ApiError> {
        let ext = self
            .accepted
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                let allowed: Vec<_> = self.accepted.iter().map(|(mime, _)| *mime).collect();
                ApiError::BadRequest(format!(
                    "Invalid file type for {field}: {content_type}. Accepted: {}",
                    allowed.join(", ")
                ))
            })?;
        if len > self.max_bytes {
            return Err(ApiError::BadRequest(format!(
                "{field} must not be larger than {} KiB",
                self.max_bytes / 1024
            )));
        }
        Ok(ext)
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
}

async fn save(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<(), ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::Internal(format!("could not create {}: {e}", dir.display())))?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("could not write {}: {e}", path.display())))?;
    metrics::counter!("uploads_total").increment(1);
    tracing::info!(path = %path.display(), size = bytes.len(), "file uploaded");
    Ok(())
}

/// Subdirectory names are limited to `[A-Za-z0-9_-]`.
fn valid_media_type(kind: &str) -> bool {
    !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingUploadResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
}

/// POST /api/admin/upload: multipart fields `logo`, `favicon` and `icon`.
///
/// Every file is checked before any is written. Uploaded logo and favicon
/// paths are also recorded in the settings.
#[tracing::instrument(skip(state, multipart))]
pub async fn branding<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    mut multipart: Multipart,
) -> Result<Json<BrandingUploadResponse>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field
            .name()
            .and_then(|n| BRANDING_FIELDS.iter().find(|f| **f == n).copied())
        else {
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            continue;
        }
        let ext = BRANDING.check(name, &content_type, bytes.len())?;
        files.push((name, ext, bytes));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No file was uploaded".to_string()));
    }

    let millis = chrono::Utc::now().timestamp_millis();
    let mut response = BrandingUploadResponse::default();
    for (name, ext, bytes) in files {
        let file_name = format!("{name}_{millis}.{ext}");
        save(&state.upload_dir, &file_name, &bytes).await?;
        let url = Some(format!("/uploads/{file_name}"));
        match name {
            "logo" => response.logo_path = url,
            "favicon" => response.favicon_path = url,
            _ => response.icon_path = url,
        }
    }

    state
        .settings
        .set_branding(response.logo_path.clone(), response.favicon_path.clone())
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct MediaUploadResponse {
    pub url: String,
    pub message: &'static str,
}

/// POST /api/upload: multipart field `file` plus optional `type`
/// subdirectory (default `general`).
#[tracing::instrument(skip(state, multipart))]
pub async fn media<S: Store + Clone + 'static>(
    _admin: AdminSession,
    State(state): State<Arc<AppState<S>>>,
    mut multipart: Multipart,
) -> Result<Json<MediaUploadResponse>, ApiError> {
    let mut file = None;
    let mut kind = DEFAULT_MEDIA_TYPE.to_string();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((content_type, bytes));
            }
            Some("type") => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = value.trim();
                if !value.is_empty() {
                    kind = value.to_string();
                }
            }
            _ => {}
        }
    }

    let Some((content_type, bytes)) = file.filter(|(_, bytes)| !bytes.is_empty()) else {
        return Err(ApiError::BadRequest("No file was uploaded".to_string()));
    };
    if !valid_media_type(&kind) {
        return Err(ApiError::BadRequest(format!("Invalid upload type: {kind}")));
    }
    let ext = MEDIA.check("file", &content_type, bytes.len())?;

    let file_name = format!("{}.{ext}", Uuid::new_v4());
    save(&state.upload_dir.join(&kind), &file_name, &bytes).await?;

    Ok(Json(MediaUploadResponse {
        url: format!("/uploads/{kind}/{file_name}"),
        message: "File uploaded",
    }))
}
