//! Read-State Tracker - Stato di lettura dei messaggi ricevuti

use crate::core::{MessagingError, Session};
use crate::repositories::MessageStore;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct ReadStateTracker {
    store: Arc<dyn MessageStore>,
}

impl ReadStateTracker {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Marca come letti tutti i messaggi che `counterpart` ha inviato all'utente della sessione.
    /// Idempotente: una seconda chiamata non modifica nulla.
    ///
    /// # Returns
    /// Numero di messaggi passati da non letti a letti
    #[instrument(skip(self, session), fields(user_id = ?session.user_id()))]
    pub async fn mark_read(
        &self,
        session: &Session,
        counterpart: &str,
    ) -> Result<u64, MessagingError> {
        let me = session.require_user()?;
        debug!("Marking conversation as read");
        let updated = self.store.mark_read(&me.user_id, counterpart).await?;
        info!(updated, "Messages marked as read");
        Ok(updated)
    }

    /// Conteggio ricalcolato ad ogni chiamata (nessun contatore mantenuto)
    ///
    /// # Arguments
    /// * `from` - Se presente conta solo i messaggi di quella controparte
    #[instrument(skip(self, session), fields(user_id = ?session.user_id()))]
    pub async fn unread_count(
        &self,
        session: &Session,
        from: Option<&str>,
    ) -> Result<u64, MessagingError> {
        let me = session.require_user()?;
        self.store.count_unread(&me.user_id, from).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MessageType, NewMessage, User, UserRole};
    use crate::repositories::InMemoryStore;

    fn session(id: &str) -> Session {
        Session::for_user(User {
            user_id: id.into(),
            username: id.into(),
            display_name: None,
            password: String::new(),
            role: UserRole::User,
        })
    }

    async fn seed(store: &InMemoryStore, sender: &str, receiver: &str, n: usize) {
        for i in 0..n {
            store
                .insert(&NewMessage {
                    sender_id: sender.into(),
                    receiver_id: receiver.into(),
                    content: format!("m{i}"),
                    media_url: None,
                    message_type: MessageType::Text,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "u1", "u2", 3).await;
        seed(&store, "u3", "u2", 2).await;
        let tracker = ReadStateTracker::new(store);
        let u2 = session("u2");

        assert_eq!(tracker.unread_count(&u2, None).await.unwrap(), 5);
        assert_eq!(tracker.mark_read(&u2, "u1").await.unwrap(), 3);
        let after_once = tracker.unread_count(&u2, None).await.unwrap();
        assert_eq!(tracker.mark_read(&u2, "u1").await.unwrap(), 0);
        assert_eq!(tracker.unread_count(&u2, None).await.unwrap(), after_once);
        assert_eq!(after_once, 2);
        assert_eq!(tracker.unread_count(&u2, Some("u1")).await.unwrap(), 0);
        assert_eq!(tracker.unread_count(&u2, Some("u3")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn only_received_messages_are_marked() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "u1", "u2", 2).await;
        let tracker = ReadStateTracker::new(store.clone());
        // il mittente non può marcare come letti i propri messaggi
        assert_eq!(tracker.mark_read(&session("u1"), "u2").await.unwrap(), 0);
        assert_eq!(store.count_unread("u2", None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn guest_cannot_mark_read() {
        let tracker = ReadStateTracker::new(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            tracker.mark_read(&Session::guest(), "u1").await,
            Err(MessagingError::NotAuthenticated)
        ));
    }
}
