use std::net::TcpListener;
use std::sync::Arc;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use scorecast_backend::run;
use scorecast_backend::config::settings::{get_config, DatabaseSettings, StorageBackend};
use scorecast_backend::db::{MemoryStore, PgStore, PredictionStore};
use scorecast_backend::telemetry::{get_subscriber, init_subscriber};

async fn build_store(database: &DatabaseSettings) -> Arc<dyn PredictionStore> {
    match database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            // Only try to establish connection when actually used
            let connection_pool = match PgPoolOptions::new()
                .max_connections(32)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .max_lifetime(Duration::from_secs(1800))
                .connect_lazy(database.connection_string().expose_secret())
            {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!("❌ Failed to create Postgres connection pool: {}", e);
                    std::process::exit(1);
                }
            };

            let store = PgStore::new(connection_pool);
            if let Err(e) = store.migrate().await {
                tracing::error!("❌ Failed to run database migrations: {}", e);
                std::process::exit(1);
            }
            tracing::info!("✅ Database migrations applied");
            Arc::new(store)
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = match get_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read the config: {}", e);
            std::process::exit(1);
        }
    };

    let subscriber = get_subscriber(
        "scorecast-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    let store = build_store(&config.database).await;

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("✅ Listening on {}", address);

    run(
        listener,
        store,
        config.admin,
        config.chat,
        config.resolution
    )?.await
}
