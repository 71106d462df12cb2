//! Marketchat library - espone i moduli principali per il binario e per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod messaging;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, Config, MessagingError, Session, auth, config};
pub use services::root;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, delete, get, post},
};
use std::sync::Arc;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes())
        .merge(configure_session_routes(state.clone()))
        .with_state(state)
}

/// Configura le routes di autenticazione (login, register)
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user))
}

/// Routes che ricevono una `Session` (guest o utente) dal middleware.
/// Sono i componenti di messaggistica a decidere cosa può fare un guest.
fn configure_session_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::session_middleware;
    use services::*;
    use ws::ws_handler;

    // gli allegati arrivano in base64 nel JSON: il limite di default di axum (2 MB)
    // renderebbe irraggiungibile MEDIA_MAX_BYTES
    let body_limit = DefaultBodyLimit::max(state.send_body_limit);

    Router::new()
        // rotta statica, ha precedenza su /messages/{counterpart_id}
        .route("/messages/unread", get(get_unread_count))
        .route(
            "/messages/{counterpart_id}",
            get(get_feed)
                .post(send_message)
                .layer(body_limit.clone()),
        )
        .route("/messages/{counterpart_id}/since", get(get_feed_since))
        .route("/messages/{counterpart_id}/read", post(mark_read))
        .route("/conversations", get(list_conversations))
        .route(
            "/support/messages",
            get(get_support_feed)
                .post(send_support_message)
                .layer(body_limit),
        )
        .route("/admin/messages", get(list_recent_messages))
        .route("/admin/messages/{message_id}", delete(delete_message))
        .route("/admin/notices/{receiver_id}", post(post_system_notice))
        .route("/ws/{counterpart_id}", any(ws_handler))
        .layer(middleware::from_fn_with_state(state, session_middleware))
}
