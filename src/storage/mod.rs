//! Storage module - Object storage per gli allegati dei messaggi
//!
//! Il Composer carica qui immagini, messaggi vocali e documenti PRIMA di inserire
//! la riga del messaggio: l'URL restituito diventa il `media_url`.

pub mod local;
pub mod memory;

pub use local::LocalObjectStorage;
pub use memory::MemoryObjectStorage;

use crate::core::MessagingError;
use async_trait::async_trait;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Persists `bytes` under `bucket/path`
    ///
    /// # Returns
    /// * `Ok(String)` - Durable public URL of the object
    /// * `Err(MessagingError::UploadFailed)` - Nothing usable was stored
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, MessagingError>;
}

/// Estensione del file a partire dal nome originale o dal content type
pub fn file_extension(file_name: Option<&str>, content_type: &str) -> &'static str {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match from_name.as_deref() {
        Some("jpg" | "jpeg") => return "jpg",
        Some("png") => return "png",
        Some("webp") => return "webp",
        Some("heic") => return "heic",
        Some("m4a") => return "m4a",
        Some("mp3") => return "mp3",
        Some("aac") => return "aac",
        Some("ogg") => return "ogg",
        Some("pdf") => return "pdf",
        Some("doc") => return "doc",
        Some("docx") => return "docx",
        _ => {}
    }

    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => "m4a",
        "audio/mpeg" => "mp3",
        "audio/aac" => "aac",
        "audio/ogg" => "ogg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_prefers_file_name() {
        assert_eq!(file_extension(Some("IMG_0001.JPEG"), "application/octet-stream"), "jpg");
        assert_eq!(file_extension(Some("ruhsat.pdf"), "image/png"), "pdf");
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(file_extension(None, "audio/mp4"), "m4a");
        assert_eq!(file_extension(Some("senza_estensione"), "image/png"), "png");
        assert_eq!(file_extension(None, "application/zip"), "bin");
    }
}
