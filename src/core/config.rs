//! Configurazione - Caricamento delle impostazioni dalle variabili d'ambiente

use dotenv::dotenv;
use std::env;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";

#[derive(Debug, Clone)]
pub struct Config {
    /// None => Conversation Store in memoria
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub connection_lifetime_secs: u64,
    pub app_env: String,
    pub support_user_id: String,
    pub media_root: String,
    pub media_public_url: String,
    pub media_bucket: String,
    pub media_max_bytes: usize,
    pub feed_page_limit: usize,
    /// Messaggi bufferizzati per conversazione prima che un subscriber lento vada in gap
    pub broadcast_capacity: usize,
}

/// Spazio per i campi JSON attorno al base64 (tipo, nome file, didascalia)
const JSON_ENVELOPE_BYTES: usize = 64 * 1024;

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Come `from_env` ma con una sorgente arbitraria (usato nei test)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = parse_or(&lookup, "SERVER_PORT", 3000u16)
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = parse_or(&lookup, "MAX_DB_CONNECTIONS", 20u32)
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let connection_lifetime_secs = parse_or(&lookup, "DB_CONNECTION_LIFETIME_SECS", 1800u64)
            .map_err(|_| {
                "Invalid DB_CONNECTION_LIFETIME_SECS: must be a positive number".to_string()
            })?;

        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());

        let support_user_id = lookup("SUPPORT_USER_ID").unwrap_or_else(|| "support".to_string());

        let media_root = lookup("MEDIA_ROOT").unwrap_or_else(|| "./media".to_string());

        let media_public_url = lookup("MEDIA_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{}:{}/media", server_host, server_port))
            .trim_end_matches('/')
            .to_string();

        let media_bucket = lookup("MEDIA_BUCKET").unwrap_or_else(|| "chat-media".to_string());

        let media_max_bytes = parse_or(&lookup, "MEDIA_MAX_BYTES", 10 * 1024 * 1024usize)
            .map_err(|_| "Invalid MEDIA_MAX_BYTES: must be a positive number".to_string())?;

        let feed_page_limit = parse_or(&lookup, "FEED_PAGE_LIMIT", 50usize)
            .map_err(|_| "Invalid FEED_PAGE_LIMIT: must be a positive number".to_string())?;
        if feed_page_limit == 0 {
            return Err("Invalid FEED_PAGE_LIMIT: must be greater than zero".to_string());
        }

        let broadcast_capacity = parse_or(&lookup, "BROADCAST_CAPACITY", 256usize)
            .map_err(|_| "Invalid BROADCAST_CAPACITY: must be a positive number".to_string())?;
        if broadcast_capacity == 0 {
            return Err("Invalid BROADCAST_CAPACITY: must be greater than zero".to_string());
        }

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            connection_lifetime_secs,
            app_env,
            support_user_id,
            media_root,
            media_public_url,
            media_bucket,
            media_max_bytes,
            feed_page_limit,
            broadcast_capacity,
        })
    }

    /// Limite del body per le route di invio: un allegato di `media_max_bytes`
    /// arriva codificato in base64 (4 byte ogni 3) dentro il JSON
    pub fn send_body_limit(&self) -> usize {
        self.media_max_bytes.div_ceil(3) * 4 + JSON_ENVELOPE_BYTES
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server Configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Server Address: {}:{}", self.server_host, self.server_port);
        match &self.database_url {
            Some(url) => info!("   Database: {}", Self::mask_url(url)),
            None => info!("   Database: in-memory (DATABASE_URL not set)"),
        }
        info!("   Max DB Connections: {}", self.max_connections);
        info!("   Connection Lifetime: {}s", self.connection_lifetime_secs);
        info!("   Support identity: {}", self.support_user_id);
        info!("   Media: {} -> {}/{}", self.media_root, self.media_public_url, self.media_bucket);
        info!(
            "   Media limit: {} bytes (request body up to {})",
            self.media_max_bytes,
            self.send_body_limit()
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("   JWT Secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("   JWT Secret: custom secret configured");
        }
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, T::Err>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>(),
        None => Ok(default),
    }
}
