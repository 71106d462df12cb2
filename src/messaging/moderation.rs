//! Admin Moderation View - Lista e cancellazione dei messaggi a livello di sistema
//!
//! Operazioni privilegiate, non realtime. La cancellazione è definitiva:
//! niente soft-delete, niente undo, niente audit log.

use crate::core::{MessagingError, Session};
use crate::entities::Message;
use crate::repositories::{MessageStore, UserStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_MODERATION_LIMIT: usize = 100;
pub const MAX_MODERATION_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct ModeratedMessage {
    pub message: Message,
    pub sender_display: String,
    pub receiver_display: String,
}

#[derive(Clone)]
pub struct Moderation {
    store: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
}

impl Moderation {
    pub fn new(store: Arc<dyn MessageStore>, users: Arc<dyn UserStore>) -> Self {
        Self { store, users }
    }

    /// Gli ultimi `limit` messaggi di tutte le conversazioni, dal più recente,
    /// con l'identità visualizzabile di mittente e destinatario
    #[instrument(skip(self, session), fields(user_id = ?session.user_id()))]
    pub async fn list_recent(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> Result<Vec<ModeratedMessage>, MessagingError> {
        session.require_admin()?;
        let limit = limit
            .unwrap_or(DEFAULT_MODERATION_LIMIT)
            .clamp(1, MAX_MODERATION_LIMIT);

        let messages = self.store.find_recent(limit).await?;

        // una sola lettura per tutti gli utenti coinvolti
        let mut ids: Vec<String> = messages
            .iter()
            .flat_map(|m| [m.sender_id.clone(), m.receiver_id.clone()])
            .collect();
        ids.sort();
        ids.dedup();
        debug!("Resolving {} identities", ids.len());

        let names: HashMap<String, String> = self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.user_id.clone(), u.display_identity().to_string()))
            .collect();

        let display = |id: &str| names.get(id).cloned().unwrap_or_else(|| id.to_string());

        let moderated: Vec<ModeratedMessage> = messages
            .into_iter()
            .map(|message| ModeratedMessage {
                sender_display: display(&message.sender_id),
                receiver_display: display(&message.receiver_id),
                message,
            })
            .collect();

        info!("Listed {} messages for moderation", moderated.len());
        Ok(moderated)
    }

    /// Cancellazione definitiva di un messaggio
    #[instrument(skip(self, session), fields(user_id = ?session.user_id()))]
    pub async fn delete_message(&self, session: &Session, id: &Uuid) -> Result<(), MessagingError> {
        let admin = session.require_admin()?;
        if !self.store.delete(id).await? {
            warn!("Message {} not found for deletion", id);
            return Err(MessagingError::NotFound);
        }
        info!(admin = %admin.user_id, message_id = %id, "Message permanently deleted");
        Ok(())
    }
}
