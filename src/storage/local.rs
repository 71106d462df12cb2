//! LocalObjectStorage - Object storage su filesystem locale

use super::ObjectStorage;
use crate::core::MessagingError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub struct LocalObjectStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rifiuta percorsi assoluti o con `..`
    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, MessagingError> {
        let relative = Path::new(bucket).join(path);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(MessagingError::UploadFailed(format!(
                "invalid object path {}/{}",
                bucket, path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, MessagingError> {
        let target = self.resolve(bucket, path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                error!("Failed to create media directory {:?}: {:?}", parent, e);
                MessagingError::UploadFailed(e.to_string())
            })?;
        }

        fs::write(&target, bytes).await.map_err(|e| {
            error!("Failed to write media object {:?}: {:?}", target, e);
            MessagingError::UploadFailed(e.to_string())
        })?;

        let url = format!("{}/{}/{}", self.public_url, bucket, path);
        info!(url = %url, "Media object stored");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("marketchat-media-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn upload_writes_file_and_returns_public_url() {
        let root = temp_root();
        let storage = LocalObjectStorage::new(&root, "http://cdn.local/media/");
        let url = storage
            .upload("chat-media", "u1/foto.jpg", b"jpegdata", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "http://cdn.local/media/chat-media/u1/foto.jpg");
        let stored = fs::read(root.join("chat-media/u1/foto.jpg")).await.unwrap();
        assert_eq!(stored, b"jpegdata");

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let storage = LocalObjectStorage::new(temp_root(), "http://cdn.local");
        let result = storage
            .upload("chat-media", "../../etc/passwd", b"x", "text/plain")
            .await;
        assert!(matches!(result, Err(MessagingError::UploadFailed(_))));
    }
}
