//! HTTP handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::info;

use super::state::AppState;
use crate::aggregator::types::StopInfo;

pub const WELCOME_MESSAGE: &str = "Welcome to the HomePage!";

pub async fn home_page() -> &'static str {
    info!(endpoint = "homePage", "Endpoint hit");
    WELCOME_MESSAGE
}

/// Aggregated arrivals for a stop.
///
/// Always answers 200: upstream failures only thin out the body.
pub async fn bus_stop_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<StopInfo> {
    info!(endpoint = "returnBusStopInfo", stop_id = %id, "Endpoint hit");
    Json(state.aggregator.stop_info(&id).await)
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
