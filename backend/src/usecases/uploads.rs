use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::repositories::storage::ObjectStorage;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::axum_http::error_responses::HttpError;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file is empty")]
    EmptyFile,
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("storage upload failed")]
    Upstream(#[source] anyhow::Error),
}

impl HttpError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::EmptyFile | UploadError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            UploadError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct UploadResponse {
    pub input_path: String,
}

#[derive(Debug)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct UploadsUseCase<S>
where
    S: ObjectStorage + Send + Sync + 'static,
{
    storage: Arc<S>,
}

impl<S> UploadsUseCase<S>
where
    S: ObjectStorage + Send + Sync + 'static,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn upload(&self, user_id: Uuid, file: UploadFile) -> Result<UploadResponse, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let content_type = resolve_content_type(file.content_type.as_deref(), file.file_name.as_deref());
        if !is_allowed(&content_type) {
            info!(%user_id, %content_type, "uploads: rejected content type");
            return Err(UploadError::UnsupportedType(content_type));
        }

        let extension = extension_for(file.file_name.as_deref(), &content_type);
        let object_key = format!("{}/{}.{}", user_id, Uuid::new_v4(), extension);
        let size = file.bytes.len();

        let input_path = self
            .storage
            .put_object(object_key, file.bytes, content_type)
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "uploads: storage put failed");
                UploadError::Upstream(err)
            })?;

        info!(%user_id, %input_path, size, "uploads: file stored");
        Ok(UploadResponse { input_path })
    }
}

fn resolve_content_type(declared: Option<&str>, file_name: Option<&str>) -> String {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    declared
        .or_else(|| {
            file_name
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|mime| mime.essence_str().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

fn is_allowed(content_type: &str) -> bool {
    content_type.starts_with("video/") || content_type.starts_with("audio/") || content_type == "text/plain"
}

/// Keeps a short alphanumeric extension from the client name, else derives one
/// from the content type.
fn extension_for(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::storage::MockObjectStorage;

    #[test]
    fn content_type_falls_back_to_file_name() {
        assert_eq!(resolve_content_type(None, Some("clip.mp4")), "video/mp4");
        assert_eq!(
            resolve_content_type(Some("application/octet-stream"), Some("notes.txt")),
            "text/plain"
        );
        assert_eq!(resolve_content_type(Some("Text/Plain; charset=utf-8"), None), "text/plain");
    }

    #[test]
    fn only_media_and_plain_text_are_allowed() {
        assert!(is_allowed("video/mp4"));
        assert!(is_allowed("audio/mpeg"));
        assert!(is_allowed("text/plain"));
        assert!(!is_allowed("text/html"));
        assert!(!is_allowed("application/pdf"));
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension_for(Some("My Clip.MOV"), "video/quicktime"), "mov");
        let traversal = extension_for(Some("../../etc/passwd"), "text/plain");
        assert!(!traversal.is_empty() && traversal.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(extension_for(None, "application/x-unknown"), "bin");
    }

    #[tokio::test]
    async fn stores_under_user_prefix() {
        let user_id = Uuid::new_v4();
        let prefix = format!("{}/", user_id);

        let mut storage = MockObjectStorage::new();
        storage
            .expect_put_object()
            .withf(move |key, bytes, content_type| {
                key.starts_with(&prefix)
                    && key.ends_with(".mp4")
                    && bytes.len() == 3
                    && content_type == "video/mp4"
            })
            .times(1)
            .returning(|key, _, _| Box::pin(async move { Ok(key) }));

        let usecase = UploadsUseCase::new(Arc::new(storage));

        let response = usecase
            .upload(
                user_id,
                UploadFile {
                    file_name: Some("clip.mp4".to_string()),
                    content_type: None,
                    bytes: vec![1, 2, 3],
                },
            )
            .await
            .unwrap();

        assert!(response.input_path.starts_with(&user_id.to_string()));
    }

    #[tokio::test]
    async fn rejects_empty_and_unsupported_files() {
        let mut storage = MockObjectStorage::new();
        storage.expect_put_object().never();
        let usecase = UploadsUseCase::new(Arc::new(storage));
        let user_id = Uuid::new_v4();

        let empty = usecase
            .upload(
                user_id,
                UploadFile {
                    file_name: Some("clip.mp4".to_string()),
                    content_type: None,
                    bytes: Vec::new(),
                },
            )
            .await;
        let pdf = usecase
            .upload(
                user_id,
                UploadFile {
                    file_name: Some("deck.pdf".to_string()),
                    content_type: Some("application/pdf".to_string()),
                    bytes: vec![1],
                },
            )
            .await;

        assert!(matches!(empty, Err(UploadError::EmptyFile)));
        assert!(matches!(pdf, Err(UploadError::UnsupportedType(_))));
    }
}
