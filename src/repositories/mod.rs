//! Repositories module - Implementazioni del Conversation Store
//!
//! Il sottosistema di messaggistica dipende solo dai trait in `traits`; qui ci sono
//! due implementazioni:
//! - `message` / `user`: MySQL tramite sqlx (query verificate a run-time, schema in `migrations/`)
//! - `memory`: store in memoria, usato quando DATABASE_URL non è impostato e nei test

pub mod memory;
pub mod message;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{FeedCursor, MessageStore, UserStore};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use memory::InMemoryStore;
pub use message::MySqlMessageRepository;
pub use user::MySqlUserRepository;
