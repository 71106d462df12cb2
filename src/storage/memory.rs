//! MemoryObjectStorage - Object storage in memoria per test e sviluppo

use super::ObjectStorage;
use crate::core::MessagingError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct MemoryObjectStorage {
    objects: DashMap<String, (Vec<u8>, String)>,
    public_url: String,
    failing: AtomicBool,
}

impl MemoryObjectStorage {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            failing: AtomicBool::new(false),
        }
    }

    /// Quando attivo ogni upload fallisce con `UploadFailed`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Contenuto di un oggetto dato il suo URL pubblico
    pub fn get_by_url(&self, url: &str) -> Option<Vec<u8>> {
        let key = url.strip_prefix(&self.public_url)?.trim_start_matches('/');
        self.objects.get(key).map(|entry| entry.value().0.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, MessagingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::UploadFailed(
                "memory storage rejecting uploads".to_string(),
            ));
        }
        let key = format!("{}/{}", bucket, path);
        self.objects
            .insert(key.clone(), (bytes.to_vec(), content_type.to_string()));
        Ok(format!("{}/{}", self.public_url, key))
    }
}
