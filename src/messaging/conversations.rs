//! Conversations - Elenco conversazioni derivato dalle righe dei messaggi
//!
//! Una conversazione non è un'entità salvata: si ottiene raggruppando i messaggi
//! dell'utente per controparte.

use crate::core::{MessagingError, Session};
use crate::entities::Message;
use crate::repositories::MessageStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub counterpart_id: String,
    pub last_message: Message,
    pub unread_count: u64,
}

#[derive(Clone)]
pub struct ConversationIndex {
    store: Arc<dyn MessageStore>,
}

impl ConversationIndex {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Controparti con cui l'utente ha scambiato messaggi, dalla più recente
    #[instrument(skip(self, session), fields(user_id = ?session.user_id()))]
    pub async fn list(&self, session: &Session) -> Result<Vec<ConversationSummary>, MessagingError> {
        let me = session.require_user()?;
        let messages = self.store.find_involving(&me.user_id).await?;
        let summaries = summarize(&me.user_id, messages);
        info!("Found {} conversations", summaries.len());
        Ok(summaries)
    }
}

/// Raggruppa per controparte: ultimo messaggio + non letti ricevuti
pub fn summarize(user_id: &str, messages: Vec<Message>) -> Vec<ConversationSummary> {
    let mut by_counterpart: HashMap<String, ConversationSummary> = HashMap::new();

    for message in messages {
        let Some(counterpart) = message.counterpart_of(user_id).map(str::to_string) else {
            continue;
        };
        let unread = u64::from(message.receiver_id == user_id && !message.is_read);

        match by_counterpart.get_mut(&counterpart) {
            Some(summary) => {
                summary.unread_count += unread;
                if message.feed_order(&summary.last_message).is_gt() {
                    summary.last_message = message;
                }
            }
            None => {
                by_counterpart.insert(
                    counterpart.clone(),
                    ConversationSummary {
                        counterpart_id: counterpart,
                        last_message: message,
                        unread_count: unread,
                    },
                );
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = by_counterpart.into_values().collect();
    summaries.sort_by(|a, b| b.last_message.feed_order(&a.last_message));
    summaries
}
