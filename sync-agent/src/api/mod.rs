//! HTTP API for the sync agent.

pub mod health;
pub mod sync;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// One reqwest client shared by every collaborator built per pass
    pub http: reqwest::Client,
    /// Held for the duration of a pass; a second trigger gets 409 instead
    /// of a chance to clobber the checkpoint
    pub pass_lock: Arc<Mutex<()>>,
    /// Cancelled on shutdown so an in-flight pass winds down
    pub cancel_token: CancellationToken,
}

/// Create shared application state
pub fn create_app_state(config: Config, cancel_token: CancellationToken) -> AppState {
    AppState {
        config: Arc::new(config),
        http: reqwest::Client::new(),
        pass_lock: Arc::new(Mutex::new(())),
        cancel_token,
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health))
        .route("/version", get(health::version))
        // Sync trigger
        .route("/sync", post(sync::trigger_sync))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
