//! Messaging module - Sottosistema di messaggistica diretta
//!
//! Flusso: Composer -> insert nello store -> pubblicazione sul ConversationHub ->
//! la Subscription del destinatario riceve il messaggio -> MessageFeed lo aggiunge
//! (dedup per id) -> ReadStateTracker lo marca come letto quando la conversazione è aperta.

pub mod composer;
pub mod conversations;
pub mod feed;
pub mod moderation;
pub mod read_state;
pub mod realtime;

pub use composer::{Composer, ComposerSettings, MediaAsset, MediaKind, Payload};
pub use conversations::{ConversationIndex, ConversationSummary};
pub use feed::{FeedLoader, MessageFeed};
pub use moderation::{ModeratedMessage, Moderation};
pub use read_state::ReadStateTracker;
pub use realtime::{ConversationHub, Subscription, SubscriptionEvent};
