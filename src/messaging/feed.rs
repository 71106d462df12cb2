//! Message Feed Loader - Storico ordinato dei messaggi tra due identità
//!
//! `FeedLoader` legge dallo store (sola lettura). `MessageFeed` è la lista lato client:
//! snapshot iniziale + eventi realtime + append ottimistico, deduplicati per id.

use crate::core::MessagingError;
use crate::entities::Message;
use crate::repositories::{FeedCursor, MessageStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Limite massimo di messaggi per singola lettura
pub const MAX_FEED_LIMIT: usize = 500;

#[derive(Clone)]
pub struct FeedLoader {
    store: Arc<dyn MessageStore>,
}

impl FeedLoader {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Tutti i messaggi tra `a` e `b`, dal più vecchio al più recente
    ///
    /// # Arguments
    /// * `limit` - Se presente restituisce solo gli ultimi `limit` messaggi
    ///   (sempre in ordine crescente), limitato a `MAX_FEED_LIMIT`
    ///
    /// # Returns
    /// * `Ok(vec![])` - Nessun messaggio: NON è un errore
    /// * `Err(StoreUnavailable)` - Il dato è sconosciuto, non vuoto
    #[instrument(skip(self))]
    pub async fn load_feed(
        &self,
        a: &str,
        b: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, MessagingError> {
        validate_pair(a, b)?;
        let limit = limit.map(|l| l.clamp(1, MAX_FEED_LIMIT));
        debug!(?limit, "Loading conversation feed");

        let mut messages = self.store.find_between(a, b, limit).await?;
        // l'ordine dello store è già questo, lo garantiamo comunque per chi implementa il trait
        messages.sort_by(|x, y| x.feed_order(y));

        info!("Loaded {} messages", messages.len());
        Ok(messages)
    }

    /// Messaggi successivi a `cursor`, per recuperare dopo un gap o una riconnessione
    #[instrument(skip(self))]
    pub async fn load_since(
        &self,
        a: &str,
        b: &str,
        cursor: &FeedCursor,
    ) -> Result<Vec<Message>, MessagingError> {
        validate_pair(a, b)?;
        let mut messages = self.store.find_between_after(a, b, cursor).await?;
        messages.sort_by(|x, y| x.feed_order(y));
        info!("Recovered {} messages after cursor", messages.len());
        Ok(messages)
    }
}

fn validate_pair(a: &str, b: &str) -> Result<(), MessagingError> {
    if a.trim().is_empty() || b.trim().is_empty() {
        return Err(MessagingError::InvalidPayload(
            "participant ids must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Lista in memoria di una conversazione aperta, ordinata per (created_at, id)
/// e senza duplicati.
///
/// Il server non la usa: è il modello per i client della libreria, che ricevono
/// uno snapshot via HTTP e poi i frame `Messages`/`Resync` dal WebSocket
/// (`Message::from(MessageDTO)`) e li riconciliano con `merge`.
#[derive(Debug, Default, Clone)]
pub struct MessageFeed {
    messages: Vec<Message>,
    ids: HashSet<Uuid>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Vec<Message>) -> Self {
        let mut feed = Self::new();
        feed.extend(snapshot);
        feed
    }

    /// Inserisce `message` nella posizione corretta
    ///
    /// # Returns
    /// `false` se un messaggio con lo stesso id era già presente (eco realtime
    /// di un append ottimistico, o evento già coperto dallo snapshot)
    pub fn merge(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id) {
            // l'unico campo che può cambiare è is_read
            if message.is_read {
                if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
                    existing.is_read = true;
                }
            }
            return false;
        }
        let position = self
            .messages
            .partition_point(|m| m.feed_order(&message).is_lt());
        self.messages.insert(position, message);
        true
    }

    /// Unisce più messaggi, restituisce quanti erano nuovi
    pub fn extend<I>(&mut self, messages: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        let mut added = 0;
        for message in messages {
            if self.merge(message) {
                added += 1;
            }
        }
        added
    }

    /// Rimuove un messaggio (ad esempio dopo la moderazione)
    pub fn remove(&mut self, id: &Uuid) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.messages.retain(|m| &m.id != id);
        true
    }

    /// Marca localmente come letti i messaggi ricevuti da `counterpart`
    pub fn mark_read_from(&mut self, counterpart: &str) -> usize {
        let mut changed = 0;
        for message in self.messages.iter_mut() {
            if message.sender_id == counterpart && !message.is_read {
                message.is_read = true;
                changed += 1;
            }
        }
        changed
    }

    /// Ultima posizione nota, da usare per `FeedLoader::load_since`
    pub fn cursor(&self) -> Option<FeedCursor> {
        self.messages.last().map(FeedCursor::of)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MessageType, NewMessage};
    use crate::repositories::InMemoryStore;
    use chrono::{Duration, Utc};

    fn new_text(sender: &str, receiver: &str, content: &str) -> NewMessage {
        NewMessage {
            sender_id: sender.into(),
            receiver_id: receiver.into(),
            content: content.into(),
            media_url: None,
            message_type: MessageType::Text,
        }
    }

    fn detached(content: &str, offset_secs: i64) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: "u1".into(),
            receiver_id: "u2".into(),
            content: content.into(),
            media_url: None,
            message_type: MessageType::Text,
            is_read: false,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn load_feed_is_ordered_in_both_directions() {
        let store = Arc::new(InMemoryStore::new());
        for (s, r, c) in [("u1", "u2", "a"), ("u2", "u1", "b"), ("u1", "u2", "c")] {
            store.insert(&new_text(s, r, c)).await.unwrap();
        }
        let loader = FeedLoader::new(store);

        for (a, b) in [("u1", "u2"), ("u2", "u1")] {
            let feed = loader.load_feed(a, b, None).await.unwrap();
            assert_eq!(feed.len(), 3);
            assert!(feed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
            assert_eq!(feed[0].content, "a");
        }
    }

    #[tokio::test]
    async fn empty_conversation_is_not_an_error() {
        let loader = FeedLoader::new(Arc::new(InMemoryStore::new()));
        assert!(loader.load_feed("u1", "u9", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_propagated_not_emptied() {
        let store = Arc::new(InMemoryStore::new());
        store.insert(&new_text("u1", "u2", "a")).await.unwrap();
        store.set_unavailable(true);
        let loader = FeedLoader::new(store);
        assert!(matches!(
            loader.load_feed("u1", "u2", None).await,
            Err(MessagingError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..3 {
            store.insert(&new_text("u1", "u2", &format!("m{i}"))).await.unwrap();
        }
        let loader = FeedLoader::new(store);
        let one = loader.load_feed("u1", "u2", Some(0)).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].content, "m2");
    }

    #[tokio::test]
    async fn load_since_returns_only_newer() {
        let store = Arc::new(InMemoryStore::new());
        let first = store.insert(&new_text("u1", "u2", "a")).await.unwrap();
        store.insert(&new_text("u2", "u1", "b")).await.unwrap();
        let loader = FeedLoader::new(store);
        let newer = loader
            .load_since("u1", "u2", &FeedCursor::of(&first))
            .await
            .unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].content, "b");
    }

    #[test]
    fn merge_deduplicates_optimistic_append_and_echo() {
        let sent = detached("Merhaba", 0);
        let mut feed = MessageFeed::new();
        assert!(feed.merge(sent.clone()));
        // eco realtime dello stesso messaggio
        assert!(!feed.merge(sent.clone()));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn merge_keeps_feed_order_for_late_events() {
        let early = detached("early", -10);
        let late = detached("late", 10);
        let mut feed = MessageFeed::from_snapshot(vec![late.clone()]);
        feed.merge(early.clone());
        let contents: Vec<_> = feed.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["early", "late"]);
        assert_eq!(feed.cursor(), Some(FeedCursor::of(&late)));
    }

    #[test]
    fn duplicate_with_read_flag_updates_existing() {
        let m = detached("x", 0);
        let mut feed = MessageFeed::from_snapshot(vec![m.clone()]);
        let mut read = m.clone();
        read.is_read = true;
        assert!(!feed.merge(read));
        assert!(feed.messages()[0].is_read);
    }

    #[test]
    fn remove_and_mark_read_from() {
        let a = detached("a", 0);
        let b = detached("b", 1);
        let mut feed = MessageFeed::from_snapshot(vec![a.clone(), b]);
        assert_eq!(feed.mark_read_from("u1"), 2);
        assert!(feed.remove(&a.id));
        assert!(!feed.remove(&a.id));
        assert_eq!(feed.len(), 1);
    }
}
