use dotenvy::dotenv;
use goal_buddy::{
    api::{AppState, app_router},
    clients::{GeminiBudgetAdvisor, HttpPredictionService},
    config::{self, database},
    errors::Result,
};
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the generative-text API key.
const GENERATIVE_API_KEY_ENV: &str = "GENERATIVE_API_KEY";

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received, draining connections.");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!("Successfully processed application configuration.");

    // 4. Connect to the database and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Build the external service clients
    // The API key is loaded here, directly before use, not stored in AppConfig
    let api_key = env::var(GENERATIVE_API_KEY_ENV)
        .inspect_err(|_| {
            warn!(
                "{} not set; budget recommendations will fail until it is provided",
                GENERATIVE_API_KEY_ENV
            );
        })
        .ok();
    let prediction = HttpPredictionService::new(&app_config.prediction)?;
    let advisor = GeminiBudgetAdvisor::new(&app_config.generative, api_key)?;
    info!(
        prediction = prediction.endpoint(),
        generative = advisor.endpoint(),
        "External service clients ready"
    );

    // 6. Serve the API
    let listen_addr = app_config.server.listen_addr;
    let state = Arc::new(AppState {
        db,
        prediction: Arc::new(prediction),
        advisor: Arc::new(advisor),
        config: Arc::new(app_config),
    });
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", listen_addr, e))?;
    info!("Listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
