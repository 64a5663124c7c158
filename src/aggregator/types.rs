//! Data types used by the aggregation pipeline.
//!
//! The `*Response` types mirror the upstream provider's JSON. Every field is
//! optional on the wire: missing keys and explicit `null`s decode to the zero
//! value so a sparse payload still produces a (sparse) result.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any JSON scalar the provider might put in a numeric-ish field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(f64),
    Other(IgnoredAny),
}

/// Text field that tolerates a bare number; anything else becomes `""`.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Text(text)) => text,
        Some(Scalar::Number(n)) => n.to_string(),
        Some(Scalar::Other(_)) | None => String::new(),
    })
}

/// Numeric field where a value of the wrong type reads as 0.
fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Number(n)) => n,
        _ => 0.0,
    })
}

/// A latitude/longitude pair, kept as the text the provider sends.
///
/// Upstream uses `lat`/`lon`; responses are written as `Lat`/`Lon`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    #[serde(rename = "Lat", alias = "lat", deserialize_with = "text_or_number")]
    pub lat: String,
    #[serde(rename = "Lon", alias = "lon", deserialize_with = "text_or_number")]
    pub lon: String,
}

impl Geometry {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }
}

/// Route metadata attached to a stop forecast entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteRef {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_name: String,
}

/// One vehicle forecast to serve the stop.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Forecast {
    #[serde(deserialize_with = "number_or_zero")]
    pub forecast_seconds: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub route: RouteRef,
    #[serde(deserialize_with = "null_as_default")]
    pub rv_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub vehicle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub vehicle_id: i64,
}

/// Stop-level forecast payload (`platformbusarrival`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StopForecastResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub geometry: Vec<Geometry>,
    #[serde(deserialize_with = "null_as_default")]
    pub forecast: Vec<Forecast>,
}

/// Speed figures reported for a vehicle.
///
/// `speed` is numeric on the wire while `avg_speed` arrives as text, though a
/// bare number is accepted there too. A value of the wrong kind reads as zero
/// instead of failing the payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleStats {
    #[serde(deserialize_with = "text_or_number")]
    pub avg_speed: String,
    #[serde(deserialize_with = "number_or_zero")]
    pub speed: f64,
}

/// Live telemetry for one vehicle on a route variant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    #[serde(deserialize_with = "null_as_default")]
    pub vehicle_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub registration_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub speed: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position: Geometry,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: VehicleStats,
}

/// Route variant payload (`routevariantvehicle`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteVariantResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub routename: String,
    #[serde(deserialize_with = "null_as_default")]
    pub vehicles: Vec<Vehicle>,
}

/// Arrival estimates for a single vehicle, rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrivalForecast {
    pub api_forecast: String,
    pub average_forecast: String,
    pub current_forecast: String,
    pub distance: String,
}

/// One route serving the stop, with a forecast per active vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusLineInfo {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub arrival_forecasts: Vec<ArrivalForecast>,
}

/// Consolidated view returned for a stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopInfo {
    pub name: String,
    pub id: i64,
    pub geometry: Option<Geometry>,
    pub bus_lines: Vec<BusLineInfo>,
}
