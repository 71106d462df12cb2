#![allow(dead_code)]

use axum_test::TestServer;
use axum_test::http::HeaderName;
use marketchat::core::{AppState, Config};
use marketchat::entities::{User, UserRole};
use marketchat::repositories::{InMemoryStore, UserStore};
use marketchat::storage::MemoryObjectStorage;
use std::sync::Arc;

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";
pub const SUPPORT_ID: &str = "support";
pub const MEDIA_URL: &str = "http://media.test/media";

/// Stato di test con accesso diretto agli store in memoria
pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryStore>,
    pub media: Arc<MemoryObjectStorage>,
}

fn test_config(overrides: &[(&str, &str)]) -> Config {
    Config::from_lookup(|key| {
        if let Some((_, value)) = overrides.iter().find(|(k, _)| *k == key) {
            return Some(value.to_string());
        }
        match key {
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            "SUPPORT_USER_ID" => Some(SUPPORT_ID.to_string()),
            "MEDIA_PUBLIC_URL" => Some(MEDIA_URL.to_string()),
            "MEDIA_MAX_BYTES" => Some("1024".to_string()),
            _ => None,
        }
    })
    .expect("valid test config")
}

fn seed_user(user_id: &str, username: &str, display_name: Option<&str>, role: UserRole) -> User {
    User {
        user_id: user_id.to_string(),
        username: username.to_string(),
        display_name: display_name.map(str::to_string),
        // hash fittizio: gli utenti seed non fanno login con password
        password: "!".to_string(),
        role,
    }
}

/// Crea un AppState sopra store e storage in memoria con gli utenti:
/// - u1 (mehmet), u2 (ayse, display name "Ayşe Y."), admin (ruolo Admin), support
pub async fn create_test_context() -> TestContext {
    create_test_context_with(&[]).await
}

/// Come `create_test_context`, con variabili di configurazione sovrascritte
/// (ad esempio `MEDIA_MAX_BYTES` o `BROADCAST_CAPACITY`)
pub async fn create_test_context_with(overrides: &[(&str, &str)]) -> TestContext {
    let store = Arc::new(InMemoryStore::new());
    let media = Arc::new(MemoryObjectStorage::new(MEDIA_URL));

    for user in [
        seed_user("u1", "mehmet", None, UserRole::User),
        seed_user("u2", "ayse", Some("Ayşe Y."), UserRole::User),
        seed_user("admin", "moderator", None, UserRole::Admin),
        seed_user(SUPPORT_ID, "support", Some("Destek"), UserRole::Support),
    ] {
        store.create(&user).await.expect("seed user");
    }

    let state = Arc::new(AppState::new(
        &test_config(overrides),
        store.clone(),
        store.clone(),
        media.clone(),
    ));

    TestContext {
        state,
        store,
        media,
    }
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = marketchat::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing
///
/// # Arguments
/// * `user_id` - ID dell'utente per cui generare il token
/// * `username` - Username dell'utente
/// * `jwt_secret` - Secret key per firmare il token
///
/// # Returns
/// Token JWT valido per 24 ore
pub fn create_test_jwt(user_id: &str, username: &str, jwt_secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Claims {
        id: String,
        username: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: user_id.to_string(),
        username: username.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Failed to create JWT token")
}

/// Header Authorization pronto per `add_header`
pub fn auth_header(user_id: &str, username: &str) -> (HeaderName, String) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", create_test_jwt(user_id, username, JWT_SECRET)),
    )
}
