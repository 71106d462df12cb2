//! WebSocket Module - Consegna in tempo reale dei messaggi di una conversazione
//!
//! Ogni connessione corrisponde a una schermata di conversazione aperta:
//! - upgrade HTTP -> WebSocket con sessione autenticata
//! - una `Subscription` sull'hub per la coppia (utente, controparte)
//! - eventi client (MarkRead, Resume) gestiti dal task di ascolto

pub mod connection;

pub use connection::handle_socket;

use crate::core::{AppError, AppState, Session};
use crate::dtos::WsEventDTO;
use axum::{
    Extension,
    extract::{Path, State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Intervallo massimo tra due flush del batch di messaggi
pub const BATCH_INTERVAL: u64 = 50;
/// Numero di messaggi oltre il quale il batch viene inviato subito
pub const BATCH_MAX_SIZE: usize = 10;
/// Timeout di inattività della connessione
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;
pub const RATE_LIMITER_MILLIS: u64 = 10;

/// Segnali tra il task di ascolto e quello di scrittura
#[derive(Debug)]
pub enum InternalSignal {
    Shutdown,
    Send(WsEventDTO),
}

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Sessione autenticata (guest => 401 prima dell'upgrade)
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(counterpart_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    let user = match session.require_user() {
        Ok(user) => user.clone(),
        Err(e) => {
            warn!("WebSocket upgrade refused for guest session");
            return Err(e.into());
        }
    };
    if counterpart_id.trim().is_empty() || counterpart_id == user.user_id {
        return Err(AppError::bad_request("invalid counterpart"));
    }

    Ok(ws
        // Possibile limitazione dei buffer, default 128 KB
        //.read_buffer_size(4*1024)
        //.write_buffer_size(16*1024)
        .on_upgrade(move |socket| handle_socket(socket, state, user, counterpart_id)))
}
