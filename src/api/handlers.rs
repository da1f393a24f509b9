//! API Handlers
//!
//! HTTP request handlers for the statistics endpoint.

use axum::{extract::State, Json};

use crate::cache::SharedCache;
use crate::models::{HealthResponse, StatsResponse};
use crate::server::Strategy;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The proxy's cache
    pub cache: SharedCache,
    /// Strategy the proxy runs under
    pub strategy: Strategy,
}

impl AppState {
    pub fn new(cache: SharedCache, strategy: Strategy) -> Self {
        Self { cache, strategy }
    }
}

/// Handler for GET /stats
///
/// Under the process strategy this reports the parent's cache only;
/// workers keep their own.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    Json(StatsResponse::new(state.strategy, &stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
