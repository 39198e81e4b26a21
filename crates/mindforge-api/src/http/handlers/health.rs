//! Unauthenticated liveness endpoint.

use axum::extract::State;
use serde::Serialize;

use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub database: bool,
    pub providers: Vec<String>,
    pub default_provider: String,
    pub in_flight_dispatches: usize,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthView> {
    let clock = RequestClock::start();
    let database = sqlx::query("SELECT 1")
        .execute(&state.db_pool.reader)
        .await
        .is_ok();
    let registry = state.dispatcher.registry();

    clock.ok(HealthView {
        status: if database { "ok" } else { "degraded" },
        database,
        providers: registry.list_names().into_iter().map(String::from).collect(),
        default_provider: registry.default_provider().to_string(),
        in_flight_dispatches: state.dispatcher.in_flight(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
