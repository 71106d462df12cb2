//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod admin;
pub mod conversation;
pub mod message;
pub mod query;
pub mod user;
pub mod ws_event;

// Re-exports per facilitare l'import
pub use admin::{ModeratedMessageDTO, SystemNoticeDTO};
pub use conversation::ConversationDTO;
pub use message::{
    MarkReadDTO, MediaUploadDTO, MessageDTO, SendMessageDTO, TextMessageDTO, UnreadCountDTO,
};
pub use query::{AdminMessagesQuery, FeedQuery, SinceQuery, UnreadQuery};
pub use user::{CreateUserDTO, LoginDTO, UserDTO};
pub use ws_event::{WsClientEventDTO, WsEventDTO};
