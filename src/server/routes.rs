//! Route definitions

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{handlers, state::AppState};

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home_page))
        .route("/getBusStopInfo/{id}", get(handlers::bus_stop_info))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
