//! InMemoryStore - Conversation Store in memoria
//!
//! Stesse garanzie dello store MySQL: id e created_at assegnati all'inserimento,
//! created_at strettamente crescente (l'ordine di inserimento è preservato anche
//! per inserimenti nello stesso microsecondo).

use super::{FeedCursor, MessageStore, UserStore};
use crate::core::MessagingError;
use crate::entities::{Message, NewMessage, User};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStore {
    messages: DashMap<Uuid, Message>,
    users: DashMap<String, User>,
    clock: Mutex<Option<DateTime<Utc>>>,
    // simula un backend irraggiungibile
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quando attivo ogni operazione fallisce con `StoreUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), MessagingError> {
        if self.unavailable.load(Ordering::SeqCst) {
            warn!("In-memory store flagged as unavailable");
            return Err(MessagingError::StoreUnavailable(
                "in-memory store offline".to_string(),
            ));
        }
        Ok(())
    }

    fn next_timestamp(&self) -> Result<DateTime<Utc>, MessagingError> {
        let mut last = self
            .clock
            .lock()
            .map_err(|_| MessagingError::StoreUnavailable("store clock poisoned".to_string()))?;
        let now = Utc::now();
        let assigned = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(assigned);
        Ok(assigned)
    }

    fn collect_sorted<P>(&self, predicate: P) -> Vec<Message>
    where
        P: Fn(&Message) -> bool,
    {
        let mut found: Vec<Message> = self
            .messages
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.feed_order(b));
        found
    }
}

fn between(message: &Message, a: &str, b: &str) -> bool {
    (message.sender_id == a && message.receiver_id == b)
        || (message.sender_id == b && message.receiver_id == a)
}

#[async_trait]
impl MessageStore for InMemoryStore {
    #[instrument(skip(self, data), fields(sender = %data.sender_id, receiver = %data.receiver_id))]
    async fn insert(&self, data: &NewMessage) -> Result<Message, MessagingError> {
        self.check_available()?;
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: data.sender_id.clone(),
            receiver_id: data.receiver_id.clone(),
            content: data.content.clone(),
            media_url: data.media_url.clone(),
            message_type: data.message_type,
            is_read: false,
            created_at: self.next_timestamp()?,
        };
        self.messages.insert(message.id, message.clone());
        debug!(message_id = %message.id, "Message row inserted");
        Ok(message)
    }

    async fn read(&self, id: &Uuid) -> Result<Option<Message>, MessagingError> {
        self.check_available()?;
        Ok(self.messages.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_between(
        &self,
        a: &str,
        b: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, MessagingError> {
        self.check_available()?;
        let mut found = self.collect_sorted(|m| between(m, a, b));
        if let Some(limit) = limit {
            let skip = found.len().saturating_sub(limit);
            found.drain(..skip);
        }
        Ok(found)
    }

    async fn find_between_after(
        &self,
        a: &str,
        b: &str,
        cursor: &FeedCursor,
    ) -> Result<Vec<Message>, MessagingError> {
        self.check_available()?;
        Ok(self.collect_sorted(|m| between(m, a, b) && cursor.precedes(m)))
    }

    async fn find_involving(&self, user_id: &str) -> Result<Vec<Message>, MessagingError> {
        self.check_available()?;
        let mut found = self.collect_sorted(|m| m.involves(user_id));
        found.reverse();
        Ok(found)
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Message>, MessagingError> {
        self.check_available()?;
        let mut found = self.collect_sorted(|_| true);
        found.reverse();
        found.truncate(limit);
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, receiver: &str, sender: &str) -> Result<u64, MessagingError> {
        self.check_available()?;
        let mut updated = 0;
        for mut entry in self.messages.iter_mut() {
            let message = entry.value_mut();
            if message.receiver_id == receiver && message.sender_id == sender && !message.is_read
            {
                message.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn count_unread(
        &self,
        receiver: &str,
        sender: Option<&str>,
    ) -> Result<u64, MessagingError> {
        self.check_available()?;
        let count = self
            .messages
            .iter()
            .filter(|entry| {
                let m = entry.value();
                m.receiver_id == receiver
                    && !m.is_read
                    && sender.is_none_or(|s| m.sender_id == s)
            })
            .count();
        Ok(count as u64)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, MessagingError> {
        self.check_available()?;
        Ok(self.messages.remove(id).is_some())
    }

    async fn count(&self) -> Result<u64, MessagingError> {
        self.check_available()?;
        Ok(self.messages.len() as u64)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, MessagingError> {
        self.check_available()?;
        Ok(self.users.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, MessagingError> {
        self.check_available()?;
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().username == username)
            .map(|entry| entry.value().clone()))
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<User>, MessagingError> {
        self.check_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn create(&self, user: &User) -> Result<User, MessagingError> {
        self.check_available()?;
        if self.users.contains_key(&user.user_id) {
            return Err(MessagingError::InvalidPayload(format!(
                "user {} already exists",
                user.user_id
            )));
        }
        self.users.insert(user.user_id.clone(), user.clone());
        Ok(user.clone())
    }
}
