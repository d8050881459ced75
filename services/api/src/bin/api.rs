//! services/api/src/bin/api.rs

use async_openai::{config::OpenAIConfig, Client};
use journal_api_lib::{
    adapters::{
        FixedConnectivity, MemoryPromptCache, OpenAiGenerationAdapter, PgPromptCache,
        TcpConnectivityProbe,
    },
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use journal_core::ports::{ConnectivityProbe, KeyValueCache};
use journal_core::PromptEngine;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Set Up the Prompt Cache ---
    let cache: Arc<dyn KeyValueCache> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_cache = PgPromptCache::new(db_pool);
            info!("Running database migrations...");
            pg_cache.run_migrations().await?;
            info!(
                "Database migrations complete. {} cached prompts.",
                pg_cache.entry_count().await?
            );
            Arc::new(pg_cache)
        }
        None => {
            warn!("DATABASE_URL is not set; prompts are cached in memory only.");
            Arc::new(MemoryPromptCache::new())
        }
    };

    // --- 3. Initialize the Generation Backend ---
    let mut openai_config = OpenAIConfig::new();
    if let Some(api_key) = &config.openai_api_key {
        openai_config = openai_config.with_api_key(api_key);
    }
    if let Some(base_url) = &config.openai_base_url {
        openai_config = openai_config.with_api_base(base_url);
    }
    let backend = Arc::new(OpenAiGenerationAdapter::new(Client::with_config(
        openai_config,
    )));

    let connectivity: Arc<dyn ConnectivityProbe> = if config.openai_api_key.is_some() {
        Arc::new(TcpConnectivityProbe::new(
            config.connectivity_host.clone(),
            config.connectivity_timeout,
        ))
    } else {
        warn!("OPENAI_API_KEY is not set; serving offline prompts only.");
        Arc::new(FixedConnectivity(false))
    };

    // --- 4. Build the Engine and the Shared AppState ---
    let engine = Arc::new(PromptEngine::new(
        backend,
        cache,
        connectivity,
        config.engine_config(),
    ));
    let app_state = Arc::new(AppState {
        engine,
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    let app = router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
