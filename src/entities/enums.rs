//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "message_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Voice,
    Location,
    Document,
    Support,
    System,
}

impl MessageType {
    /// I tipi che richiedono un asset binario già caricato nello storage
    pub fn requires_media(&self) -> bool {
        matches!(self, Self::Image | Self::Voice | Self::Document)
    }

    /// Didascalia usata quando il mittente non ne fornisce una
    pub fn default_caption(&self) -> &'static str {
        match self {
            Self::Image => "Photo",
            Self::Voice => "Voice message",
            Self::Document => "Document",
            Self::Location => "Location",
            Self::Text | Self::Support | Self::System => "",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
    Support,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_types_are_the_binary_ones() {
        assert!(MessageType::Image.requires_media());
        assert!(MessageType::Voice.requires_media());
        assert!(MessageType::Document.requires_media());
        assert!(!MessageType::Location.requires_media());
        assert!(!MessageType::Text.requires_media());
    }

    #[test]
    fn message_type_uses_lowercase_on_the_wire() {
        let json = serde_json::to_string(&MessageType::Voice).unwrap();
        assert_eq!(json, "\"voice\"");
        let parsed: MessageType = serde_json::from_str("\"support\"").unwrap();
        assert_eq!(parsed, MessageType::Support);
    }
}
