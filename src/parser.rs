//! JSON decoding for upstream payloads.

use serde::de::DeserializeOwned;

use crate::aggregator::types::{RouteVariantResponse, StopForecastResponse};
use crate::error::UpstreamError;

/// Decodes a JSON body into `T`.
///
/// # Errors
///
/// Returns [`UpstreamError::Decode`] if the bytes are not valid JSON for `T`.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, UpstreamError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes a `platformbusarrival` body.
pub fn parse_stop_forecast(bytes: &[u8]) -> Result<StopForecastResponse, UpstreamError> {
    parse_json(bytes)
}

/// Decodes a `routevariantvehicle` body.
pub fn parse_route_variant(bytes: &[u8]) -> Result<RouteVariantResponse, UpstreamError> {
    parse_json(bytes)
}
