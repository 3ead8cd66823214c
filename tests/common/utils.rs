use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, PgConnection, Connection, Executor};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;
use once_cell::sync::Lazy;

use scorecast_backend::run;
use scorecast_backend::config::settings::{get_config, AdminSettings, ChatSettings, DatabaseSettings, ResolutionSettings};
use scorecast_backend::db::{MemoryStore, PgStore, PredictionStore};
use scorecast_backend::telemetry::{get_subscriber, init_subscriber};

pub const TEST_CHAT_ID: i64 = -1001234567890;

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp{
    pub address: String,
    pub store: Arc<dyn PredictionStore>,
    pub admin_token: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(ResolutionSettings::default()).await
}

/// Runs against an in-memory store unless `TEST_STORAGE=postgres`, in which
/// case every app gets its own freshly migrated database.
pub async fn spawn_app_with(resolution: ResolutionSettings) -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store: Arc<dyn PredictionStore> = match std::env::var("TEST_STORAGE").as_deref() {
        Ok("postgres") => {
            let mut configuration = get_config().expect("Failed to read configuration.");
            configuration.database.db_name = Uuid::new_v4().to_string();
            configuration.database.db_url = None;
            Arc::new(PgStore::new(configure_db(&configuration.database).await))
        }
        _ => Arc::new(MemoryStore::new()),
    };

    let admin_token = Uuid::new_v4().to_string();
    let admin_settings = AdminSettings {
        api_token: SecretString::new(admin_token.clone().into_boxed_str()),
    };
    let chat_settings = ChatSettings {
        allowed_group_id: Some(TEST_CHAT_ID),
    };

    let server = run(
        listener,
        store.clone(),
        admin_settings,
        chat_settings,
        resolution,
    )
        .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);
    TestApp {
        address,
        store,
        admin_token,
    }
}

pub async fn configure_db(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(
            &config.connection_string_without_db()
        )
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}
