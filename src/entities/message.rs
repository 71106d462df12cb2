//! Message entity - Entità messaggio diretto tra due identità

use super::enums::MessageType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    // assegnato dallo store all'inserimento
    pub id: Uuid,
    pub sender_id: String,
    pub receiver_id: String,
    // per i messaggi non testuali è una didascalia ("Photo", "Voice message", ...)
    pub content: String,
    pub media_url: Option<String>,
    pub message_type: MessageType,
    // unico campo mutabile dopo la creazione
    pub is_read: bool,
    // assegnato dallo store, mai dal client (evita problemi di clock skew)
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Ordinamento totale all'interno di una conversazione: (created_at, id)
    pub fn feed_order(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }

    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(&self.sender_id, &self.receiver_id)
    }

    /// Restituisce l'altra parte della conversazione vista da `user_id`
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.sender_id == user_id {
            Some(&self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.counterpart_of(user_id).is_some()
    }
}

/// Riga da inserire: id e created_at vengono assegnati dallo store
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub media_url: Option<String>,
    pub message_type: MessageType,
}

/// Coppia non ordinata di partecipanti: key(A, B) == key(B, A)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    low: String,
    high: String,
}

impl ConversationKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { low: a.to_string(), high: b.to_string() }
        } else {
            Self { low: b.to_string(), high: a.to_string() }
        }
    }

    pub fn participants(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.low == user_id || self.high == user_id
    }
}
