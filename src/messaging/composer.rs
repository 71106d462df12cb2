//! Composer - Invio di nuovi messaggi
//!
//! Ordine delle operazioni per i payload binari: prima l'upload nello storage, poi
//! l'insert della riga con il `media_url` ottenuto. Se l'upload fallisce non viene
//! inserito nulla. Nessun retry: ogni invio è fire-once.

use super::realtime::ConversationHub;
use crate::core::{MessagingError, Session};
use crate::entities::{Message, MessageType, NewMessage};
use crate::repositories::MessageStore;
use crate::storage::{ObjectStorage, file_extension};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const MAX_TEXT_CHARS: usize = 5000;
pub const MAX_CAPTION_CHARS: usize = 500;

/// Tipi di allegato binario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Voice,
    Document,
}

impl From<MediaKind> for MessageType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => MessageType::Image,
            MediaKind::Voice => MessageType::Voice,
            MediaKind::Document => MessageType::Document,
        }
    }
}

/// Asset locale ancora da caricare
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub enum Payload {
    Text {
        content: String,
    },
    Media {
        kind: MediaKind,
        asset: MediaAsset,
        caption: Option<String>,
    },
    Location {
        latitude: f64,
        longitude: f64,
        label: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub bucket: String,
    pub support_user_id: String,
    pub max_media_bytes: usize,
}

#[derive(Clone)]
pub struct Composer {
    store: Arc<dyn MessageStore>,
    media: Arc<dyn ObjectStorage>,
    hub: ConversationHub,
    settings: ComposerSettings,
}

/// Deep link verso la mappa per i messaggi di posizione
pub fn location_url(latitude: f64, longitude: f64) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={:.6},{:.6}",
        latitude, longitude
    )
}

impl Composer {
    pub fn new(
        store: Arc<dyn MessageStore>,
        media: Arc<dyn ObjectStorage>,
        hub: ConversationHub,
        settings: ComposerSettings,
    ) -> Self {
        Self {
            store,
            media,
            hub,
            settings,
        }
    }

    pub fn support_user_id(&self) -> &str {
        &self.settings.support_user_id
    }

    /// Invia `payload` da parte dell'utente della sessione a `counterpart`
    ///
    /// # Returns
    /// * `Ok(Message)` - La riga inserita (id e created_at dello store) per l'append ottimistico
    /// * `Err(NotAuthenticated)` - Sessione guest, nessuna riga inserita
    /// * `Err(InvalidPayload)` - Contenuto non valido, nessuna riga inserita
    /// * `Err(UploadFailed)` - Upload fallito, nessuna riga inserita
    /// * `Err(StoreUnavailable)` - Insert fallito
    #[instrument(skip(self, session, payload), fields(user_id = ?session.user_id(), counterpart = %counterpart))]
    pub async fn send(
        &self,
        session: &Session,
        counterpart: &str,
        payload: Payload,
    ) -> Result<Message, MessagingError> {
        let me = session.require_user()?;
        let sender_id = me.user_id.as_str();

        if counterpart.trim().is_empty() {
            return Err(MessagingError::InvalidPayload(
                "counterpart id must not be empty".to_string(),
            ));
        }
        if counterpart == sender_id {
            return Err(MessagingError::InvalidPayload(
                "cannot send a message to yourself".to_string(),
            ));
        }

        let (new_message, uploaded) = match payload {
            Payload::Text { content } => {
                let content = validate_text(&content)?;
                let message_type = if self.involves_support(sender_id, counterpart) {
                    MessageType::Support
                } else {
                    MessageType::Text
                };
                let message = NewMessage {
                    sender_id: sender_id.to_string(),
                    receiver_id: counterpart.to_string(),
                    content,
                    media_url: None,
                    message_type,
                };
                (message, None)
            }
            Payload::Media {
                kind,
                asset,
                caption,
            } => {
                let message_type = MessageType::from(kind);
                let caption = validate_caption(caption.as_deref(), message_type)?;
                self.validate_asset(&asset)?;

                // upload PRIMA dell'insert
                let path = format!(
                    "{}/{}.{}",
                    sender_id,
                    Uuid::new_v4(),
                    file_extension(asset.file_name.as_deref(), &asset.content_type)
                );
                debug!(path = %path, "Uploading media before insert");
                let url = self
                    .media
                    .upload(&self.settings.bucket, &path, &asset.bytes, &asset.content_type)
                    .await
                    .inspect_err(|e| warn!("Media upload failed, message not inserted: {}", e))?;

                let message = NewMessage {
                    sender_id: sender_id.to_string(),
                    receiver_id: counterpart.to_string(),
                    content: caption,
                    media_url: Some(url.clone()),
                    message_type,
                };
                (message, Some(url))
            }
            Payload::Location {
                latitude,
                longitude,
                label,
            } => {
                validate_coordinates(latitude, longitude)?;
                let content = validate_caption(label.as_deref(), MessageType::Location)?;
                let message = NewMessage {
                    sender_id: sender_id.to_string(),
                    receiver_id: counterpart.to_string(),
                    content,
                    media_url: Some(location_url(latitude, longitude)),
                    message_type: MessageType::Location,
                };
                (message, None)
            }
        };

        let message = match self.store.insert(&new_message).await {
            Ok(message) => message,
            Err(e) => {
                if let Some(url) = uploaded {
                    // oggetto orfano: nessuna riga lo referenzia
                    warn!(orphaned_object = %url, "Insert failed after successful upload");
                }
                return Err(e);
            }
        };

        let receivers = self.hub.publish(&message);
        info!(
            message_id = %message.id,
            message_type = ?message.message_type,
            receivers,
            "Message sent"
        );
        Ok(message)
    }

    /// Messaggio di sistema dall'identità di supporto (avvisi sugli annunci, ecc.)
    #[instrument(skip(self, content))]
    pub async fn post_system(
        &self,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, MessagingError> {
        if receiver_id.trim().is_empty() {
            return Err(MessagingError::InvalidPayload(
                "receiver id must not be empty".to_string(),
            ));
        }
        let content = validate_text(content)?;
        let message = self
            .store
            .insert(&NewMessage {
                sender_id: self.settings.support_user_id.clone(),
                receiver_id: receiver_id.to_string(),
                content,
                media_url: None,
                message_type: MessageType::System,
            })
            .await?;
        self.hub.publish(&message);
        info!(message_id = %message.id, "System message posted");
        Ok(message)
    }

    fn involves_support(&self, sender_id: &str, counterpart: &str) -> bool {
        let support = self.settings.support_user_id.as_str();
        sender_id == support || counterpart == support
    }

    fn validate_asset(&self, asset: &MediaAsset) -> Result<(), MessagingError> {
        if asset.bytes.is_empty() {
            return Err(MessagingError::InvalidPayload(
                "media asset is empty".to_string(),
            ));
        }
        if asset.bytes.len() > self.settings.max_media_bytes {
            return Err(MessagingError::InvalidPayload(format!(
                "media asset exceeds {} bytes",
                self.settings.max_media_bytes
            )));
        }
        Ok(())
    }
}

fn validate_text(content: &str) -> Result<String, MessagingError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(MessagingError::InvalidPayload(
            "message content must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TEXT_CHARS {
        return Err(MessagingError::InvalidPayload(format!(
            "message content exceeds {} characters",
            MAX_TEXT_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_caption(
    caption: Option<&str>,
    message_type: MessageType,
) -> Result<String, MessagingError> {
    match caption.map(str::trim).filter(|c| !c.is_empty()) {
        Some(caption) if caption.chars().count() > MAX_CAPTION_CHARS => {
            Err(MessagingError::InvalidPayload(format!(
                "caption exceeds {} characters",
                MAX_CAPTION_CHARS
            )))
        }
        Some(caption) => Ok(caption.to_string()),
        None => Ok(message_type.default_caption().to_string()),
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), MessagingError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if !valid {
        return Err(MessagingError::InvalidPayload(
            "coordinates out of range".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{User, UserRole};
    use crate::messaging::realtime::SubscriptionEvent;
    use crate::repositories::InMemoryStore;
    use crate::storage::MemoryObjectStorage;

    struct Fixture {
        store: Arc<InMemoryStore>,
        media: Arc<MemoryObjectStorage>,
        hub: ConversationHub,
        composer: Composer,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let media = Arc::new(MemoryObjectStorage::new("http://cdn.test"));
        let hub = ConversationHub::new();
        let composer = Composer::new(
            store.clone(),
            media.clone(),
            hub.clone(),
            ComposerSettings {
                bucket: "chat-media".into(),
                support_user_id: "support".into(),
                max_media_bytes: 1024,
            },
        );
        Fixture {
            store,
            media,
            hub,
            composer,
        }
    }

    fn session(id: &str) -> Session {
        Session::for_user(User {
            user_id: id.into(),
            username: id.into(),
            display_name: None,
            password: String::new(),
            role: UserRole::User,
        })
    }

    fn image(bytes: &[u8]) -> Payload {
        Payload::Media {
            kind: MediaKind::Image,
            asset: MediaAsset {
                bytes: bytes.to_vec(),
                file_name: Some("arac.jpg".into()),
                content_type: "image/jpeg".into(),
            },
            caption: None,
        }
    }

    #[tokio::test]
    async fn text_message_is_inserted_unread() {
        let f = fixture();
        let sent = f
            .composer
            .send(&session("u1"), "u2", Payload::Text { content: "  Merhaba ".into() })
            .await
            .unwrap();
        assert_eq!(sent.content, "Merhaba");
        assert_eq!(sent.sender_id, "u1");
        assert_eq!(sent.receiver_id, "u2");
        assert_eq!(sent.message_type, MessageType::Text);
        assert!(!sent.is_read);
        assert_eq!(f.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn guest_send_inserts_nothing() {
        let f = fixture();
        let result = f
            .composer
            .send(&Session::guest(), "u2", Payload::Text { content: "selam".into() })
            .await;
        assert!(matches!(result, Err(MessagingError::NotAuthenticated)));
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn image_is_uploaded_before_insert() {
        let f = fixture();
        let sent = f.composer.send(&session("u1"), "u2", image(b"jpeg")).await.unwrap();
        assert_eq!(sent.message_type, MessageType::Image);
        assert_eq!(sent.content, "Photo");
        let url = sent.media_url.expect("image must carry a media url");
        assert!(url.starts_with("http://cdn.test/chat-media/u1/"));
        assert!(url.ends_with(".jpg"));
        assert_eq!(f.media.get_by_url(&url).as_deref(), Some(&b"jpeg"[..]));
    }

    #[tokio::test]
    async fn failed_upload_inserts_nothing() {
        let f = fixture();
        f.media.set_failing(true);
        let result = f.composer.send(&session("u1"), "u2", image(b"jpeg")).await;
        assert!(matches!(result, Err(MessagingError::UploadFailed(_))));
        assert_eq!(f.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_or_empty_assets_are_rejected() {
        let f = fixture();
        let too_big = vec![0u8; 2048];
        assert!(matches!(
            f.composer.send(&session("u1"), "u2", image(&too_big)).await,
            Err(MessagingError::InvalidPayload(_))
        ));
        assert!(matches!(
            f.composer.send(&session("u1"), "u2", image(b"")).await,
            Err(MessagingError::InvalidPayload(_))
        ));
        assert!(f.media.is_empty());
    }

    #[tokio::test]
    async fn location_is_encoded_as_deep_link() {
        let f = fixture();
        let sent = f
            .composer
            .send(
                &session("u1"),
                "u2",
                Payload::Location {
                    latitude: 41.0082,
                    longitude: 28.9784,
                    label: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(sent.message_type, MessageType::Location);
        assert_eq!(sent.content, "Location");
        assert_eq!(
            sent.media_url.as_deref(),
            Some("https://www.google.com/maps/search/?api=1&query=41.008200,28.978400")
        );

        let invalid = f
            .composer
            .send(
                &session("u1"),
                "u2",
                Payload::Location {
                    latitude: 91.0,
                    longitude: 0.0,
                    label: None,
                },
            )
            .await;
        assert!(matches!(invalid, Err(MessagingError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn text_to_support_is_tagged() {
        let f = fixture();
        let sent = f
            .composer
            .send(&session("u1"), "support", Payload::Text { content: "yardım".into() })
            .await
            .unwrap();
        assert_eq!(sent.message_type, MessageType::Support);
    }

    #[tokio::test]
    async fn invalid_text_is_rejected() {
        let f = fixture();
        let me = session("u1");
        let too_long = "x".repeat(MAX_TEXT_CHARS + 1);
        for content in ["", "   ", too_long.as_str()] {
            let result = f
                .composer
                .send(&me, "u2", Payload::Text { content: content.to_string() })
                .await;
            assert!(matches!(result, Err(MessagingError::InvalidPayload(_))));
        }
        assert!(matches!(
            f.composer.send(&me, "u1", Payload::Text { content: "io".into() }).await,
            Err(MessagingError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn sent_message_is_published_to_subscribers() {
        let f = fixture();
        let mut sub = f.hub.subscribe("u2", "u1");
        let sent = f
            .composer
            .send(&session("u1"), "u2", Payload::Text { content: "Merhaba".into() })
            .await
            .unwrap();
        match sub.next().await {
            Some(SubscriptionEvent::Message(m)) => assert_eq!(m.id, sent.id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn system_message_comes_from_support() {
        let f = fixture();
        let notice = f.composer.post_system("u1", "İlanınız yayında").await.unwrap();
        assert_eq!(notice.sender_id, "support");
        assert_eq!(notice.message_type, MessageType::System);
    }
}
