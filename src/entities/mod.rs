//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene le entità che rappresentano i dati persistiti nel Conversation Store.
//! Ogni entity corrisponde a una tabella (vedi `migrations/`).

pub mod enums;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use enums::{MessageType, UserRole};
pub use message::{ConversationKey, Message, NewMessage};
pub use user::User;
