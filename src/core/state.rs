//! Application State - Stato globale dell'applicazione
//!
//! Contiene gli store iniettati, i componenti del sottosistema di messaggistica
//! e la configurazione condivisa da route e middleware.

use crate::core::Config;
use crate::messaging::{
    Composer, ComposerSettings, ConversationHub, ConversationIndex, FeedLoader, Moderation,
    ReadStateTracker,
};
use crate::repositories::{MessageStore, UserStore};
use crate::storage::ObjectStorage;
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Conversation Store (tabella messaggi)
    pub store: Arc<dyn MessageStore>,

    /// Tabella utenti, per autenticazione e viste admin
    pub users: Arc<dyn UserStore>,

    /// Canali realtime per le conversazioni aperte
    pub hub: ConversationHub,

    pub feed: FeedLoader,
    pub composer: Composer,
    pub read_state: ReadStateTracker,
    pub conversations: ConversationIndex,
    pub moderation: Moderation,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Identità di supporto per la chat di assistenza
    pub support_user_id: String,

    /// Numero di messaggi restituiti quando il client non specifica `limit`
    pub feed_page_limit: usize,

    /// Limite del body per le route di invio (allegati in base64)
    pub send_body_limit: usize,
}

impl AppState {
    /// Crea una nuova istanza di AppState collegando tutti i componenti agli store forniti
    ///
    /// # Arguments
    /// * `config` - Configurazione caricata da env
    /// * `store` - Conversation Store (MySQL o in memoria)
    /// * `users` - Store degli utenti
    /// * `media` - Object storage per gli allegati
    pub fn new(
        config: &Config,
        store: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
        media: Arc<dyn ObjectStorage>,
    ) -> Self {
        let hub = ConversationHub::with_capacity(config.broadcast_capacity);
        let composer = Composer::new(
            store.clone(),
            media,
            hub.clone(),
            ComposerSettings {
                bucket: config.media_bucket.clone(),
                support_user_id: config.support_user_id.clone(),
                max_media_bytes: config.media_max_bytes,
            },
        );

        Self {
            feed: FeedLoader::new(store.clone()),
            read_state: ReadStateTracker::new(store.clone()),
            conversations: ConversationIndex::new(store.clone()),
            moderation: Moderation::new(store.clone(), users.clone()),
            composer,
            hub,
            store,
            users,
            jwt_secret: config.jwt_secret.clone(),
            support_user_id: config.support_user_id.clone(),
            feed_page_limit: config.feed_page_limit,
            send_body_limit: config.send_body_limit(),
        }
    }
}
