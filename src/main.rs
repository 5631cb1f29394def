use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dealership_api::{
    auth::TokenVerifier,
    build_router,
    config::Config,
    constants::API_NAME,
    repository::{CarStore, MemoryCarStore, PgCarStore},
    service::CarService,
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("{} Starting server on port {}", API_NAME, config.server_port);

    let store: Arc<dyn CarStore> = if config.uses_memory_store() {
        tracing::warn!("{} Using in-memory store; data is lost on exit", API_NAME);
        Arc::new(MemoryCarStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        tracing::info!("{} Connected to database", API_NAME);

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("{} Database migrations completed", API_NAME);

        Arc::new(PgCarStore::new(pool))
    };

    let state = AppState {
        cars: CarService::new(store),
        tokens: TokenVerifier::new(&config.token_secret),
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("{} Server listening on {}", API_NAME, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
