//! Trait for a real-time transit data provider.

use async_trait::async_trait;

use crate::aggregator::types::{RouteVariantResponse, StopForecastResponse};
use crate::error::UpstreamError;

/// Abstraction over the upstream provider serving stop forecasts and
/// route variant telemetry.
#[async_trait]
pub trait TransitApi: Send + Sync {
    /// Returns the stop's identity, geometry and forecast entries.
    async fn fetch_stop_forecast(
        &self,
        stop_id: &str,
    ) -> Result<StopForecastResponse, UpstreamError>;

    /// Returns route identity and live vehicles for one route variant.
    async fn fetch_route_variant(&self, rv_id: i64)
    -> Result<RouteVariantResponse, UpstreamError>;
}
