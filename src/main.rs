use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use transfer_market_api::api::{build_router, AppState, Storage};
use transfer_market_api::config::{AppConfig, StorageBackend};
use transfer_market_api::infrastructure::repositories::InMemoryDatabase;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    if std::env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET not set, using development secret");
    }

    let storage = match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(database_url)) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database connected and migrated");
            Storage::postgres(pool)
        }
        (StorageBackend::Postgres, None) => return Err("DATABASE_URL must be set".into()),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Storage::in_memory(&InMemoryDatabase::new())
        }
    };

    let app = build_router(AppState::new(storage, &config));

    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
