//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Gli handler estraggono la `Session` dalle Extension, chiamano i componenti di
//! `messaging` e convertono il risultato in DTO. Gli errori di dominio diventano
//! `AppError` tramite `From<MessagingError>`.

pub mod admin;
pub mod auth;
pub mod messages;

// Re-exports per facilitare l'import
pub use admin::{delete_message, list_recent_messages, post_system_notice};
pub use auth::{login_user, register_user};
pub use messages::{
    get_feed, get_feed_since, get_support_feed, get_unread_count, list_conversations, mark_read,
    send_message, send_support_message,
};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
