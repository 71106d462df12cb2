//! Admin DTOs - Vista di moderazione

use super::MessageDTO;
use crate::messaging::ModeratedMessage;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModeratedMessageDTO {
    #[serde(flatten)]
    pub message: MessageDTO,
    pub sender_display: String,
    pub receiver_display: String,
}

impl From<ModeratedMessage> for ModeratedMessageDTO {
    fn from(value: ModeratedMessage) -> Self {
        Self {
            message: MessageDTO::from(value.message),
            sender_display: value.sender_display,
            receiver_display: value.receiver_display,
        }
    }
}

/// Avviso di sistema inviato dall'identità di supporto
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SystemNoticeDTO {
    #[validate(length(min = 1, max = 5000, message = "Notice must be between 1 and 5000 characters"))]
    pub content: String,
}
