use marketchat::core::{AppState, Config};
use marketchat::repositories::{
    InMemoryStore, MessageStore, MySqlMessageRepository, MySqlUserRepository, UserStore,
};
use marketchat::storage::{LocalObjectStorage, ObjectStorage};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketchat=info,tower_http=info")),
        )
        .init();

    // Inizializza la configurazione
    let config = Config::from_env()?;
    config.print_info();

    // Conversation Store: MySQL se configurato, altrimenti in memoria
    let (store, users): (Arc<dyn MessageStore>, Arc<dyn UserStore>) = match &config.database_url {
        Some(url) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database connected and migrated");
            let store: Arc<dyn MessageStore> = Arc::new(MySqlMessageRepository::new(pool.clone()));
            let users: Arc<dyn UserStore> = Arc::new(MySqlUserRepository::new(pool));
            (store, users)
        }
        None => {
            warn!("DATABASE_URL not set, messages are kept in memory only");
            let memory = Arc::new(InMemoryStore::new());
            let store: Arc<dyn MessageStore> = memory.clone();
            let users: Arc<dyn UserStore> = memory;
            (store, users)
        }
    };

    let media: Arc<dyn ObjectStorage> = Arc::new(LocalObjectStorage::new(
        &config.media_root,
        &config.media_public_url,
    ));

    let state = Arc::new(AppState::new(&config, store, users, media));

    // Crea il router
    let app = marketchat::create_router(state)
        .nest_service("/media", ServeDir::new(&config.media_root))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    // Avvia il server
    axum::serve(listener, app).await?;

    Ok(())
}
