//! File storage for event images and profile photos.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::MAX_UPLOAD_BYTES;
use crate::errors::{AppError, AppResult};

/// File storage trait for dependency injection.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under `folder` and return the public URL.
    ///
    /// Only PNG, JPEG, WebP and GIF content up to [`MAX_UPLOAD_BYTES`] is
    /// accepted. The stored extension follows the content type.
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String>;
}

/// Writes uploads beneath a local directory served at `/uploads`.
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= 32
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Accepted image types and the extension they are stored under
const IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Stored extension for an accepted content type. The client's file name
/// never picks it, so nothing is served back as markup.
fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Leading bytes must match the claimed format
fn has_signature(ext: &str, bytes: &[u8]) -> bool {
    match ext {
        "png" => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "jpg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        "webp" => bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP",
        _ => false,
    }
}

fn validate_upload(folder: &str, content_type: &str, bytes: &[u8]) -> AppResult<&'static str> {
    if !is_safe_segment(folder) {
        return Err(AppError::validation("Invalid upload folder"));
    }
    let ext = extension_for(content_type).ok_or_else(|| {
        AppError::validation("Only PNG, JPEG, WebP and GIF images are accepted")
    })?;
    if bytes.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::validation(format!(
            "Uploaded file exceeds {} bytes",
            MAX_UPLOAD_BYTES
        )));
    }
    if !has_signature(ext, bytes) {
        return Err(AppError::validation("File content does not match its image type"));
    }
    Ok(ext)
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        let ext = validate_upload(folder, content_type, &bytes)?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_name), &bytes).await?;

        tracing::info!(
            folder,
            original = file_name,
            file = %stored_name,
            size = bytes.len(),
            "File stored"
        );
        Ok(format!(
            "{}/uploads/{}/{}",
            self.public_base_url, folder, stored_name
        ))
    }
}
