//! Image upload handler.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::config::MAX_UPLOAD_BYTES;
use crate::errors::{AppError, AppResult};
use crate::types::Created;

/// Where the upload goes
#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// `profiles` (default) or `events` (admins only)
    pub folder: Option<String>,
}

/// Multipart form layout, for the API docs
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Mounted under `/uploads`, alongside the static file service
pub fn upload_routes() -> Router<AppState> {
    // Room for the multipart framing around a maximum-size image
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

/// Upload one image as the multipart field `file`
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Uploads",
    params(UploadQuery),
    request_body(
        content = UploadForm,
        content_type = "multipart/form-data",
        description = "Image in the `file` field"
    ),
    responses(
        (status = 201, description = "Stored", body = UploadResponse),
        (status = 400, description = "Missing, empty, oversized or non-image file")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Created<UploadResponse>> {
    let folder = query.folder.unwrap_or_else(|| "profiles".to_string());
    match folder.as_str() {
        "profiles" => {}
        "events" => require_admin(&user)?,
        _ => return Err(AppError::validation("Folder must be `profiles` or `events`")),
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        let url = state
            .storage
            .upload(&folder, &file_name, &content_type, bytes.to_vec())
            .await?;

        tracing::info!(user_id = %user.id, folder = %folder, "File uploaded");
        return Ok(Created(UploadResponse { url }));
    }

    Err(AppError::validation("Multipart field `file` is required"))
}
