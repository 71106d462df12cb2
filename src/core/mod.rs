//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione JWT e sessione
//! - Configurazione
//! - Gestione errori
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{Claims, decode_jwt, encode_jwt, session_middleware};
pub use config::Config;
pub use error::{AppError, MessagingError};
pub use session::{Identity, Session};
pub use state::AppState;
