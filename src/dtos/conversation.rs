//! Conversation DTOs - Riepilogo conversazioni per la lista chat

use super::MessageDTO;
use crate::messaging::ConversationSummary;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConversationDTO {
    pub counterpart_id: String,
    pub last_message: MessageDTO,
    pub unread_count: u64,
}

impl From<ConversationSummary> for ConversationDTO {
    fn from(value: ConversationSummary) -> Self {
        Self {
            counterpart_id: value.counterpart_id,
            last_message: MessageDTO::from(value.last_message),
            unread_count: value.unread_count,
        }
    }
}
