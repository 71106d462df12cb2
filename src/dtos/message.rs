//! Message DTOs - Data Transfer Objects per messaggi

use crate::core::MessagingError;
use crate::entities::{Message, MessageType};
use crate::messaging::{MediaAsset, MediaKind, Payload};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDTO {
    pub id: Uuid,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            id: value.id,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            content: value.content,
            media_url: value.media_url,
            message_type: value.message_type,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

/// Lato client: i messaggi ricevuti da HTTP o WS tornano entità per `MessageFeed`
impl From<MessageDTO> for Message {
    fn from(value: MessageDTO) -> Self {
        Self {
            id: value.id,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            content: value.content,
            media_url: value.media_url,
            message_type: value.message_type,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

impl From<&Message> for MessageDTO {
    fn from(value: &Message) -> Self {
        Self::from(value.clone())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct TextMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}

/// Allegato binario codificato in base64 nel body JSON
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct MediaUploadDTO {
    #[validate(length(min = 1, message = "Media data must not be empty"))]
    pub data_base64: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    #[validate(length(max = 500, message = "Caption must be at most 500 characters"))]
    pub caption: Option<String>,
}

/// Body di invio messaggio, il tipo è nel campo "type":
/// { "type": "text", "content": "Merhaba" }
/// { "type": "image", "data_base64": "...", "caption": "Ön cephe" }
/// { "type": "location", "latitude": 41.0, "longitude": 29.0 }
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SendMessageDTO {
    Text(TextMessageDTO),
    Image(MediaUploadDTO),
    Voice(MediaUploadDTO),
    Document(MediaUploadDTO),
    Location {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        label: Option<String>,
    },
}

impl SendMessageDTO {
    /// Valida il body e lo converte nel payload del Composer
    pub fn into_payload(self) -> Result<Payload, MessagingError> {
        match self {
            SendMessageDTO::Text(body) => {
                body.validate()?;
                Ok(Payload::Text {
                    content: body.content,
                })
            }
            SendMessageDTO::Image(upload) => upload.into_payload(MediaKind::Image),
            SendMessageDTO::Voice(upload) => upload.into_payload(MediaKind::Voice),
            SendMessageDTO::Document(upload) => upload.into_payload(MediaKind::Document),
            SendMessageDTO::Location {
                latitude,
                longitude,
                label,
            } => Ok(Payload::Location {
                latitude,
                longitude,
                label,
            }),
        }
    }
}

impl MediaUploadDTO {
    fn into_payload(self, kind: MediaKind) -> Result<Payload, MessagingError> {
        self.validate()?;
        let bytes = STANDARD
            .decode(self.data_base64.trim())
            .map_err(|e| MessagingError::InvalidPayload(format!("invalid base64 data: {}", e)))?;
        let content_type = self
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Ok(Payload::Media {
            kind,
            asset: MediaAsset {
                bytes,
                file_name: self.file_name,
                content_type,
            },
            caption: self.caption,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkReadDTO {
    pub updated: u64,
    pub unread_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadCountDTO {
    pub unread_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_body_is_parsed_by_tag() {
        let dto: SendMessageDTO =
            serde_json::from_value(json!({"type": "text", "content": "Merhaba"})).unwrap();
        match dto.into_payload().unwrap() {
            Payload::Text { content } => assert_eq!(content, "Merhaba"),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn media_body_is_decoded() {
        let dto: SendMessageDTO = serde_json::from_value(json!({
            "type": "voice",
            "data_base64": STANDARD.encode(b"ses"),
            "content_type": "audio/mp4"
        }))
        .unwrap();
        match dto.into_payload().unwrap() {
            Payload::Media { kind, asset, caption } => {
                assert_eq!(kind, MediaKind::Voice);
                assert_eq!(asset.bytes, b"ses");
                assert_eq!(asset.content_type, "audio/mp4");
                assert!(caption.is_none());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn invalid_bodies_are_rejected() {
        let empty: SendMessageDTO =
            serde_json::from_value(json!({"type": "text", "content": ""})).unwrap();
        assert!(matches!(empty.into_payload(), Err(MessagingError::InvalidPayload(_))));

        let broken: SendMessageDTO = serde_json::from_value(json!({
            "type": "image",
            "data_base64": "%%%non-base64%%%"
        }))
        .unwrap();
        assert!(matches!(broken.into_payload(), Err(MessagingError::InvalidPayload(_))));

        assert!(serde_json::from_value::<SendMessageDTO>(json!({"type": "sticker"})).is_err());
    }
}
