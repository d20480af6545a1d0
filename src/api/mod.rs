//! JSON-over-HTTP surface under `/api/v1`.

pub mod auth;
pub mod contributions;
pub mod error;
pub mod expenses;
pub mod goals;
pub mod profile;
pub mod recommendations;
pub mod targets;

use crate::{
    config::{AppConfig, ServerConfig},
    core::{budget::BudgetAdvisor, recommendation::PredictionService},
};
use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Shared state handed to every handler.
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Scores goal feature vectors
    pub prediction: Arc<dyn PredictionService>,
    /// Proposes budgets
    pub advisor: Arc<dyn BudgetAdvisor>,
    /// Loaded application settings
    pub config: Arc<AppConfig>,
}

async fn healthz() -> &'static str {
    "ok"
}

fn cors_layer(allowed: &[String]) -> CorsLayer {
    if allowed.iter().any(|origin| origin == "*") {
        return CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any);
    }

    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .inspect_err(|_| warn!("Ignoring invalid CORS origin {:?}", origin))
                .ok()
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_headers(Any)
        .allow_methods(Any)
}

/// Requests still running after the configured timeout are answered with 408.
fn timeout_layer(server: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, server.request_timeout())
}

/// Builds the application router with tracing, timeout and CORS layers.
pub fn app_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let cors = cors_layer(&server.cors_allow_origins);
    let timeout = timeout_layer(server);

    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(goals::router())
        .merge(contributions::router())
        .merge(targets::router())
        .merge(profile::router())
        .merge(expenses::router())
        .merge(recommendations::router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
