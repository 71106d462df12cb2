//! MySqlMessageRepository - Conversation Store su MySQL
//!
//! Le query usano `sqlx::query_as` (verifica a run-time) così il crate compila senza
//! un database raggiungibile. L'id è un UUID generato qui, created_at lo assegna MySQL
//! (`DEFAULT CURRENT_TIMESTAMP(6)`), quindi dopo l'insert la riga viene riletta.

use super::{FeedCursor, MessageStore};
use crate::core::MessagingError;
use crate::entities::{Message, MessageType, NewMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, content, media_url, message_type, is_read, created_at";

/// Riga così come esce da MySQL (id in CHAR(36))
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    sender_id: String,
    receiver_id: String,
    content: String,
    media_url: Option<String>,
    message_type: MessageType,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = MessagingError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id).map_err(|e| {
            error!("Corrupted message id {}: {:?}", row.id, e);
            MessagingError::StoreUnavailable(format!("corrupted message id {}", row.id))
        })?;
        Ok(Message {
            id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            content: row.content,
            media_url: row.media_url,
            message_type: row.message_type,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

fn into_messages(rows: Vec<MessageRow>) -> Result<Vec<Message>, MessagingError> {
    rows.into_iter().map(Message::try_from).collect()
}

// MESSAGE REPO
pub struct MySqlMessageRepository {
    connection_pool: MySqlPool,
}

impl MySqlMessageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl MessageStore for MySqlMessageRepository {
    #[instrument(skip(self, data), fields(sender = %data.sender_id, receiver = %data.receiver_id))]
    async fn insert(&self, data: &NewMessage) -> Result<Message, MessagingError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content, media_url, message_type, is_read)
            VALUES (?, ?, ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(id.to_string())
        .bind(&data.sender_id)
        .bind(&data.receiver_id)
        .bind(&data.content)
        .bind(&data.media_url)
        .bind(data.message_type)
        .execute(&self.connection_pool)
        .await?;

        debug!(message_id = %id, "Message row inserted");

        // rileggiamo la riga per avere il created_at assegnato dal server
        self.read(&id).await?.ok_or(MessagingError::NotFound)
    }

    async fn read(&self, id: &Uuid) -> Result<Option<Message>, MessagingError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.connection_pool)
        .await?;

        row.map(Message::try_from).transpose()
    }

    async fn find_between(
        &self,
        a: &str,
        b: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, MessagingError> {
        // Con il limite prendiamo i più recenti in DESC e poi invertiamo
        let messages = match limit {
            Some(limit) => {
                let rows = sqlx::query_as::<_, MessageRow>(&format!(
                    r#"
                    SELECT {MESSAGE_COLUMNS} FROM messages
                    WHERE (sender_id = ? AND receiver_id = ?)
                       OR (sender_id = ? AND receiver_id = ?)
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?
                    "#
                ))
                .bind(a)
                .bind(b)
                .bind(b)
                .bind(a)
                .bind(limit as i64)
                .fetch_all(&self.connection_pool)
                .await?;
                let mut messages = into_messages(rows)?;
                messages.reverse();
                messages
            }
            None => {
                let rows = sqlx::query_as::<_, MessageRow>(&format!(
                    r#"
                    SELECT {MESSAGE_COLUMNS} FROM messages
                    WHERE (sender_id = ? AND receiver_id = ?)
                       OR (sender_id = ? AND receiver_id = ?)
                    ORDER BY created_at ASC, id ASC
                    "#
                ))
                .bind(a)
                .bind(b)
                .bind(b)
                .bind(a)
                .fetch_all(&self.connection_pool)
                .await?;
                into_messages(rows)?
            }
        };

        Ok(messages)
    }

    async fn find_between_after(
        &self,
        a: &str,
        b: &str,
        cursor: &FeedCursor,
    ) -> Result<Vec<Message>, MessagingError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE ((sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?))
              AND (created_at > ? OR (created_at = ? AND id > ?))
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .bind(cursor.created_at)
        .bind(cursor.created_at)
        .bind(cursor.id.to_string())
        .fetch_all(&self.connection_pool)
        .await?;

        into_messages(rows)
    }

    async fn find_involving(&self, user_id: &str) -> Result<Vec<Message>, MessagingError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE sender_id = ? OR receiver_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        into_messages(rows)
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Message>, MessagingError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(limit as i64)
        .fetch_all(&self.connection_pool)
        .await?;

        into_messages(rows)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, receiver: &str, sender: &str) -> Result<u64, MessagingError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE WHERE receiver_id = ? AND sender_id = ? AND is_read = FALSE",
        )
        .bind(receiver)
        .bind(sender)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_unread(
        &self,
        receiver: &str,
        sender: Option<&str>,
    ) -> Result<u64, MessagingError> {
        let count: i64 = match sender {
            Some(sender) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND sender_id = ? AND is_read = FALSE",
                )
                .bind(receiver)
                .bind(sender)
                .fetch_one(&self.connection_pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND is_read = FALSE",
                )
                .bind(receiver)
                .fetch_one(&self.connection_pool)
                .await?
            }
        };

        Ok(count.max(0) as u64)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, MessagingError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.connection_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, MessagingError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.connection_pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}
