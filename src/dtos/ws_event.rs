//! WebSocket Event DTOs - Data Transfer Objects per eventi WebSocket

use crate::dtos::MessageDTO;
use crate::repositories::FeedCursor;
use serde::{Deserialize, Serialize};

/// Eventi server -> client
/// Tagged union, serde serializza come:
/// { "type": "Messages", "data": [ ... ] }
/// oppure
/// { "type": "UnreadCount", "data": { "unread_count": 0 } }
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum WsEventDTO {
    /// Nuovi messaggi, in ordine di consegna
    Messages(Vec<MessageDTO>),
    /// Messaggi recuperati dallo store dopo un gap o un Resume
    Resync(Vec<MessageDTO>),
    UnreadCount { unread_count: u64 },
    Error { code: u16, message: String },
}

/// Eventi client -> server
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum WsClientEventDTO {
    /// La conversazione è visibile: marca come letti i messaggi della controparte
    MarkRead,
    /// Riprende dopo una riconnessione dall'ultimo messaggio visto
    Resume(FeedCursor),
}
