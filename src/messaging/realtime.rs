//! Realtime Subscriber - Sottoscrizioni live ai nuovi messaggi di una conversazione
//!
//! Un canale broadcast per coppia di partecipanti. Il Composer pubblica ogni riga
//! appena inserita; ogni schermata di conversazione aperta tiene una `Subscription`.
//! Un receiver rimasto indietro non perde messaggi in silenzio: riceve un evento
//! `Gap` e può recuperare dallo store partendo da `Subscription::cursor()`.

use crate::entities::{ConversationKey, Message};
use crate::repositories::FeedCursor;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast::{self, Sender};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, instrument, warn};

pub const BROADCAST_CHANNEL_CAPACITY: usize = 256;

struct HubInner {
    /// tx head del canale broadcast per ogni conversazione con almeno un subscriber
    channels: DashMap<ConversationKey, Sender<Arc<Message>>>,
    capacity: usize,
    active: AtomicUsize,
}

#[derive(Clone)]
pub struct ConversationHub {
    inner: Arc<HubInner>,
}

impl Default for ConversationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHub {
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ConversationHub {
            inner: Arc::new(HubInner {
                channels: DashMap::new(),
                capacity: capacity.max(1),
                active: AtomicUsize::new(0),
            }),
        }
    }

    #[instrument(skip(self))]
    pub fn subscribe(&self, a: &str, b: &str) -> Subscription {
        let key = ConversationKey::new(a, b);
        let rx = match self.inner.channels.entry(key.clone()) {
            Entry::Occupied(channel) => {
                debug!("Subscribing to existing conversation channel");
                channel.get().subscribe()
            }
            Entry::Vacant(slot) => {
                info!("Creating new broadcast channel for conversation");
                // Arc<Message> per condividere il riferimento, non copiare il messaggio per ogni rx
                let (tx, rx) = broadcast::channel::<Arc<Message>>(self.inner.capacity);
                slot.insert(tx);
                rx
            }
        };
        self.inner.active.fetch_add(1, Ordering::SeqCst);

        Subscription {
            key,
            stream: Some(BroadcastStream::new(rx)),
            hub: self.clone(),
            last_seen: None,
            covered: None,
        }
    }

    /// Consegna `message` a ogni subscription aperta sulla sua coppia di partecipanti
    ///
    /// # Returns
    /// Numero di receiver raggiunti (0 se nessuno ha la conversazione aperta)
    #[instrument(skip(self, message), fields(message_id = %message.id))]
    pub fn publish(&self, message: &Message) -> usize {
        let key = message.conversation_key();
        let sent = match self.inner.channels.get(&key) {
            Some(tx) => tx.send(Arc::new(message.clone())),
            None => {
                debug!("No open subscription for conversation");
                return 0;
            }
        };
        // il lock sulla entry è già rilasciato qui
        match sent {
            Ok(receivers) => {
                debug!(receivers, "Message broadcast to receivers");
                receivers
            }
            Err(_) => {
                warn!("No active receivers, removing channel");
                self.prune(&key);
                0
            }
        }
    }

    /// Numero di subscription non ancora rilasciate
    pub fn active_subscriptions(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Numero di conversazioni con un canale aperto
    pub fn open_channels(&self) -> usize {
        self.inner.channels.len()
    }

    fn release(&self, key: &ConversationKey) {
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
        self.prune(key);
    }

    fn prune(&self, key: &ConversationKey) {
        if self
            .inner
            .channels
            .remove_if(key, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            debug!("Conversation channel released");
        }
    }
}

#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    Message(Arc<Message>),
    /// Il receiver è rimasto indietro e `missed` messaggi non sono stati consegnati
    Gap { missed: u64 },
}

/// Sottoscrizione a una conversazione. Va rilasciata con `unsubscribe` alla chiusura
/// della schermata; il drop la rilascia comunque.
pub struct Subscription {
    key: ConversationKey,
    stream: Option<BroadcastStream<Arc<Message>>>,
    hub: ConversationHub,
    last_seen: Option<FeedCursor>,
    /// Fin qui il client ha già i messaggi da uno snapshot o da un resync:
    /// gli eventi ancora nel buffer fino a questo punto non vanno riconsegnati
    covered: Option<FeedCursor>,
}

impl Subscription {
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Posizione dell'ultimo messaggio visto (consegnato o caricato con lo snapshot)
    pub fn cursor(&self) -> Option<FeedCursor> {
        self.last_seen
    }

    /// Avanza il cursore dopo aver caricato uno snapshot o un resync dallo store.
    /// Gli eventi del buffer che non seguono `cursor` vengono poi saltati da `next`.
    pub fn observe(&mut self, cursor: FeedCursor) {
        advance(&mut self.covered, cursor);
        advance(&mut self.last_seen, cursor);
    }

    /// Prossimo evento nell'ordine di consegna dello store
    ///
    /// # Returns
    /// `None` quando la subscription è stata rilasciata o il canale è chiuso
    pub async fn next(&mut self) -> Option<SubscriptionEvent> {
        loop {
            let stream = self.stream.as_mut()?;
            match stream.next().await? {
                Ok(message) => {
                    if self.covered.is_some_and(|c| !c.precedes(&message)) {
                        debug!(message_id = %message.id, "Skipping message already covered by store reload");
                        continue;
                    }
                    advance(&mut self.last_seen, FeedCursor::of(&message));
                    return Some(SubscriptionEvent::Message(message));
                }
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    warn!(missed, "Subscription lagged behind, gap detected");
                    return Some(SubscriptionEvent::Gap { missed });
                }
            }
        }
    }

    /// Rilascio esplicito
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        // il receiver va droppato prima del prune, altrimenti receiver_count non scende
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.hub.release(&self.key);
        }
    }
}

fn advance(slot: &mut Option<FeedCursor>, cursor: FeedCursor) {
    let newer = match slot {
        Some(current) => (cursor.created_at, cursor.id) > (current.created_at, current.id),
        None => true,
    };
    if newer {
        *slot = Some(cursor);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
