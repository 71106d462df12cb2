//! Conversation Store traits
//!
//! This module defines the interfaces the messaging subsystem consumes from the
//! backing store. The store is the single source of truth: it assigns message ids
//! and timestamps, and serializes each single-row mutation.

use crate::core::MessagingError;
use crate::entities::{Message, NewMessage, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Position inside a conversation feed, compared as `(created_at, id)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl FeedCursor {
    pub fn of(message: &Message) -> Self {
        Self {
            created_at: message.created_at,
            id: message.id,
        }
    }

    /// True if `message` comes strictly after this position
    pub fn precedes(&self, message: &Message) -> bool {
        (message.created_at, message.id) > (self.created_at, self.id)
    }
}

/// Message table operations
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts a new message row
    ///
    /// # Returns
    /// * `Ok(Message)` - Row with `id`, `created_at` and `is_read = false` assigned by the store
    /// * `Err(MessagingError::StoreUnavailable)` - Insert failed
    async fn insert(&self, data: &NewMessage) -> Result<Message, MessagingError>;

    /// Reads a single message by id
    async fn read(&self, id: &Uuid) -> Result<Option<Message>, MessagingError>;

    /// Messages exchanged between `a` and `b` in either direction
    ///
    /// # Arguments
    /// * `limit` - When set, only the most recent `limit` messages are returned
    ///
    /// # Returns
    /// Messages ordered by `(created_at, id)` ascending (oldest first)
    async fn find_between(
        &self,
        a: &str,
        b: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, MessagingError>;

    /// Messages between `a` and `b` strictly after `cursor`, oldest first
    async fn find_between_after(
        &self,
        a: &str,
        b: &str,
        cursor: &FeedCursor,
    ) -> Result<Vec<Message>, MessagingError>;

    /// Every message sent or received by `user_id`, newest first
    async fn find_involving(&self, user_id: &str) -> Result<Vec<Message>, MessagingError>;

    /// The `limit` most recent messages across all conversations, newest first
    async fn find_recent(&self, limit: usize) -> Result<Vec<Message>, MessagingError>;

    /// Sets `is_read = true` where `receiver_id = receiver`, `sender_id = sender` and
    /// the message is still unread
    ///
    /// # Returns
    /// Number of rows actually changed (0 when everything was already read)
    async fn mark_read(&self, receiver: &str, sender: &str) -> Result<u64, MessagingError>;

    /// Unread messages addressed to `receiver`, optionally only those from `sender`
    async fn count_unread(
        &self,
        receiver: &str,
        sender: Option<&str>,
    ) -> Result<u64, MessagingError>;

    /// Hard delete
    ///
    /// # Returns
    /// * `Ok(true)` - Row removed
    /// * `Ok(false)` - No row with that id
    async fn delete(&self, id: &Uuid) -> Result<bool, MessagingError>;

    /// Total number of rows
    async fn count(&self) -> Result<u64, MessagingError>;
}

/// User table operations needed by auth and by the moderation view
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, MessagingError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, MessagingError>;

    /// Reads multiple users by id
    ///
    /// # Note
    /// Users are returned in store order, which may not match `ids`.
    /// Unknown ids are skipped.
    async fn find_many(&self, ids: &[String]) -> Result<Vec<User>, MessagingError>;

    async fn create(&self, user: &User) -> Result<User, MessagingError>;
}
