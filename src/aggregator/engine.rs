use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::aggregator::geo::{Unit, distance};
use crate::aggregator::types::{
    ArrivalForecast, BusLineInfo, Forecast, Geometry, RouteVariantResponse, StopForecastResponse,
    StopInfo, Vehicle,
};
use crate::aggregator::utility::{eta_seconds, format_fixed, parse_or_zero};
use crate::services::transit_api::TransitApi;

/// Maps vehicle ID to the provider's forecast seconds. A vehicle listed twice
/// keeps its last entry.
pub fn forecast_lookup(forecasts: &[Forecast]) -> HashMap<i64, f64> {
    forecasts
        .iter()
        .map(|f| (f.vehicle_id, f.forecast_seconds))
        .collect()
}

/// Route variant IDs referenced by the forecasts, in first-seen order.
pub fn distinct_route_variants(forecasts: &[Forecast]) -> Vec<i64> {
    let mut rv_ids = Vec::new();
    for f in forecasts {
        if !rv_ids.contains(&f.rv_id) {
            rv_ids.push(f.rv_id);
        }
    }
    rv_ids
}

/// First geometry point of the stop and its coordinates.
///
/// A stop without geometry yields `None` and is measured from (0, 0).
pub fn stop_location(stop: &StopForecastResponse) -> (Option<Geometry>, (f64, f64)) {
    match stop.geometry.first() {
        Some(g) => (Some(g.clone()), (parse_or_zero(&g.lat), parse_or_zero(&g.lon))),
        None => (None, (0.0, 0.0)),
    }
}

/// Distance and arrival estimates for one vehicle relative to the stop.
///
/// Each estimate is guarded by its own speed: a zero instantaneous speed
/// forces only `current_forecast` to `"0"`, a zero average speed forces only
/// `average_forecast` to `"0"`.
pub fn estimate_arrival(stop: (f64, f64), vehicle: &Vehicle, api_forecast: f64) -> ArrivalForecast {
    let vehicle_lat = parse_or_zero(&vehicle.position.lat);
    let vehicle_lon = parse_or_zero(&vehicle.position.lon);
    let km = distance(stop.0, stop.1, vehicle_lat, vehicle_lon, Some(Unit::Kilometers));

    let avg_speed = parse_or_zero(&vehicle.stats.avg_speed);

    ArrivalForecast {
        api_forecast: format_fixed(api_forecast),
        average_forecast: eta_seconds(km, avg_speed),
        current_forecast: eta_seconds(km, vehicle.stats.speed),
        distance: format_fixed(km),
    }
}

/// Builds a bus line with one forecast per vehicle, in upstream order.
///
/// Vehicles without a stop forecast entry are kept with an API forecast of 0.
pub fn build_bus_line(
    route: &RouteVariantResponse,
    stop: (f64, f64),
    lookup: &HashMap<i64, f64>,
) -> BusLineInfo {
    let arrival_forecasts = route
        .vehicles
        .iter()
        .map(|v| {
            let api_forecast = lookup.get(&v.vehicle_id).copied().unwrap_or_default();
            estimate_arrival(stop, v, api_forecast)
        })
        .collect();

    BusLineInfo {
        id: route.id,
        name: route.name.clone(),
        short_name: route.routename.clone(),
        arrival_forecasts,
    }
}

/// Combines a stop forecast with route snapshots already fetched in
/// discovery order.
pub fn merge(stop: &StopForecastResponse, routes: &[RouteVariantResponse]) -> StopInfo {
    let (geometry, coords) = stop_location(stop);
    let lookup = forecast_lookup(&stop.forecast);

    StopInfo {
        name: stop.name.clone(),
        id: stop.id,
        geometry,
        bus_lines: routes
            .iter()
            .map(|route| build_bus_line(route, coords, &lookup))
            .collect(),
    }
}

/// Fetches everything needed for a stop and merges it.
///
/// Upstream failures never abort the aggregation: the failing resource is
/// logged and replaced by its zero value.
pub struct Aggregator {
    api: Arc<dyn TransitApi>,
    route_fetch_concurrency: usize,
}

impl Aggregator {
    pub fn new(api: Arc<dyn TransitApi>, route_fetch_concurrency: usize) -> Self {
        Self {
            api,
            route_fetch_concurrency: route_fetch_concurrency.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn stop_info(&self, stop_id: &str) -> StopInfo {
        let stop = match self.api.fetch_stop_forecast(stop_id).await {
            Ok(stop) => stop,
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Stop forecast fetch failed");
                StopForecastResponse::default()
            }
        };

        if stop.geometry.is_empty() {
            warn!("Stop has no geometry, distances are measured from (0, 0)");
        }

        let rv_ids = distinct_route_variants(&stop.forecast);
        debug!(
            forecasts = stop.forecast.len(),
            route_variants = rv_ids.len(),
            "Stop forecast received"
        );

        let routes = self.fetch_routes(&rv_ids).await;
        let info = merge(&stop, &routes);

        info!(bus_lines = info.bus_lines.len(), "Stop info aggregated");
        info
    }

    /// Fetches every route variant with at most `route_fetch_concurrency`
    /// requests in flight. The result is in the same order as `rv_ids`.
    async fn fetch_routes(&self, rv_ids: &[i64]) -> Vec<RouteVariantResponse> {
        let semaphore = Arc::new(Semaphore::new(self.route_fetch_concurrency));

        let tasks: Vec<_> = rv_ids
            .iter()
            .map(|&rv_id| {
                let sem = Arc::clone(&semaphore);
                let api = Arc::clone(&self.api);
                let span = tracing::info_span!("fetch_route_variant", rv_id);

                tokio::spawn(
                    async move {
                        let _permit = sem.acquire_owned().await;
                        match api.fetch_route_variant(rv_id).await {
                            Ok(route) => {
                                debug!(vehicles = route.vehicles.len(), "Route variant received");
                                route
                            }
                            Err(e) => {
                                error!(kind = e.kind(), error = %e, "Route variant fetch failed");
                                RouteVariantResponse::default()
                            }
                        }
                    }
                    .instrument(span),
                )
            })
            .collect();

        let mut routes = Vec::with_capacity(tasks.len());
        for (rv_id, task) in rv_ids.iter().zip(tasks) {
            match task.await {
                Ok(route) => routes.push(route),
                Err(e) => {
                    error!(rv_id, error = %e, "Route variant task failed");
                    routes.push(RouteVariantResponse::default());
                }
            }
        }
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::types::{RouteRef, VehicleStats};
    use crate::error::UpstreamError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    fn forecast(vehicle_id: i64, rv_id: i64, forecast_seconds: f64) -> Forecast {
        Forecast {
            forecast_seconds,
            route: RouteRef::default(),
            rv_id,
            vehicle: String::new(),
            vehicle_id,
        }
    }

    fn vehicle(vehicle_id: i64, lat: &str, lon: &str, speed: f64, avg_speed: &str) -> Vehicle {
        Vehicle {
            vehicle_id,
            registration_code: format!("SBS{vehicle_id}"),
            speed: String::new(),
            position: Geometry::new(lat, lon),
            stats: VehicleStats {
                avg_speed: avg_speed.to_string(),
                speed,
            },
        }
    }

    fn route(id: i64, vehicles: Vec<Vehicle>) -> RouteVariantResponse {
        RouteVariantResponse {
            id,
            name: format!("Route {id}"),
            routename: format!("{id}A"),
            vehicles,
        }
    }

    fn stop(forecasts: Vec<Forecast>) -> StopForecastResponse {
        StopForecastResponse {
            id: 100,
            name: "Orchard Stn".to_string(),
            geometry: vec![Geometry::new("1.3000", "103.8000")],
            forecast: forecasts,
        }
    }

    #[test]
    fn test_forecast_lookup_last_write_wins() {
        let lookup = forecast_lookup(&[
            forecast(55, 7, 120.0),
            forecast(56, 7, 30.0),
            forecast(55, 3, 90.0),
        ]);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup[&55], 90.0);
        assert_eq!(lookup[&56], 30.0);
    }

    #[test]
    fn test_distinct_route_variants_first_seen_order() {
        let forecasts: Vec<_> = [7, 3, 7, 9]
            .iter()
            .enumerate()
            .map(|(i, &rv)| forecast(i as i64, rv, 0.0))
            .collect();
        assert_eq!(distinct_route_variants(&forecasts), vec![7, 3, 9]);
        assert!(distinct_route_variants(&[]).is_empty());
    }

    #[test]
    fn test_zero_current_speed_keeps_average_estimate() {
        let v = vehicle(1, "1.3100", "103.8000", 0.0, "25");
        let a = estimate_arrival((1.3, 103.8), &v, 0.0);
        let km = parse_or_zero(&a.distance);

        assert_eq!(a.current_forecast, "0");
        assert_ne!(a.average_forecast, "0");
        let avg = parse_or_zero(&a.average_forecast);
        assert!((avg - km * 3600.0 / 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_average_speed_keeps_current_estimate() {
        let v = vehicle(1, "1.3100", "103.8000", 30.0, "0");
        let a = estimate_arrival((1.3, 103.8), &v, 0.0);
        let km = parse_or_zero(&a.distance);

        assert_eq!(a.average_forecast, "0");
        let current = parse_or_zero(&a.current_forecast);
        assert!((current - km * 3600.0 / 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_unparseable_average_speed_counts_as_zero() {
        let v = vehicle(1, "1.3100", "103.8000", 0.0, "n/a");
        let a = estimate_arrival((1.3, 103.8), &v, 12.5);
        assert_eq!(a.current_forecast, "0");
        assert_eq!(a.average_forecast, "0");
        assert_eq!(a.api_forecast, "12.500000");
    }

    #[test]
    fn test_unparseable_position_is_measured_from_origin() {
        let v = vehicle(1, "", "bad", 30.0, "25");
        let a = estimate_arrival((0.0, 0.0), &v, 0.0);
        assert_eq!(a.distance, "0.000000");
        assert_eq!(a.current_forecast, "0.000000");
    }

    #[test]
    fn test_nan_position_is_not_reported_at_the_stop() {
        let v = vehicle(1, "NaN", "103.8000", 30.0, "25");
        let a = estimate_arrival((1.3, 103.8), &v, 0.0);
        assert_eq!(a.distance, "NaN");
        assert_eq!(a.current_forecast, "NaN");
        assert_eq!(a.average_forecast, "NaN");
    }

    #[test]
    fn test_every_vehicle_is_covered() {
        let r = route(
            7,
            vec![
                vehicle(55, "1.31", "103.80", 30.0, "25"),
                vehicle(99, "1.32", "103.80", 30.0, "25"),
            ],
        );
        let lookup = forecast_lookup(&[forecast(55, 7, 120.0)]);
        let line = build_bus_line(&r, (1.3, 103.8), &lookup);

        assert_eq!(line.id, 7);
        assert_eq!(line.name, "Route 7");
        assert_eq!(line.short_name, "7A");
        assert_eq!(line.arrival_forecasts.len(), 2);
        assert_eq!(line.arrival_forecasts[0].api_forecast, "120.000000");
        assert_eq!(line.arrival_forecasts[1].api_forecast, "0.000000");
    }

    #[test]
    fn test_merge_without_geometry() {
        let mut s = stop(vec![forecast(1, 7, 10.0)]);
        s.geometry.clear();
        let info = merge(&s, &[route(7, vec![vehicle(1, "0", "0", 10.0, "10")])]);

        assert_eq!(info.geometry, None);
        assert_eq!(info.bus_lines[0].arrival_forecasts[0].distance, "0.000000");
    }

    #[test]
    fn test_merge_uses_first_geometry_point() {
        let mut s = stop(vec![]);
        s.geometry.push(Geometry::new("9", "9"));
        let info = merge(&s, &[]);

        assert_eq!(info.id, 100);
        assert_eq!(info.name, "Orchard Stn");
        assert_eq!(info.geometry, Some(Geometry::new("1.3000", "103.8000")));
        assert!(info.bus_lines.is_empty());
    }

    /// Serves canned responses; route fetches sleep so that earlier route
    /// variants finish last.
    struct FakeApi {
        stop: Option<StopForecastResponse>,
        routes: HashMap<i64, RouteVariantResponse>,
        calls: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl TransitApi for FakeApi {
        async fn fetch_stop_forecast(
            &self,
            _stop_id: &str,
        ) -> Result<StopForecastResponse, UpstreamError> {
            self.stop.clone().ok_or(UpstreamError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            })
        }

        async fn fetch_route_variant(
            &self,
            rv_id: i64,
        ) -> Result<RouteVariantResponse, UpstreamError> {
            self.calls.lock().unwrap().push(rv_id);
            let delay = 50u64.saturating_sub(self.calls.lock().unwrap().len() as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.routes
                .get(&rv_id)
                .cloned()
                .ok_or(UpstreamError::InvalidUrl(format!("no route {rv_id}")))
        }
    }

    fn fake(stop: Option<StopForecastResponse>, routes: Vec<RouteVariantResponse>) -> Arc<FakeApi> {
        Arc::new(FakeApi {
            stop,
            routes: routes.into_iter().map(|r| (r.id, r)).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_route_order_is_discovery_order_under_concurrency() {
        let s = stop(vec![
            forecast(1, 7, 10.0),
            forecast(2, 3, 20.0),
            forecast(3, 7, 30.0),
            forecast(4, 9, 40.0),
        ]);
        let api = fake(
            Some(s),
            vec![route(7, vec![]), route(3, vec![]), route(9, vec![])],
        );

        let info = Aggregator::new(api.clone(), 4).stop_info("100").await;
        let ids: Vec<_> = info.bus_lines.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![7, 3, 9]);

        let mut calls = api.calls.lock().unwrap().clone();
        calls.sort_unstable();
        assert_eq!(calls, vec![3, 7, 9]);
    }

    #[tokio::test]
    async fn test_sequential_fetching_with_single_permit() {
        let s = stop(vec![forecast(1, 9, 1.0), forecast(2, 3, 1.0)]);
        let api = fake(Some(s), vec![route(9, vec![]), route(3, vec![])]);

        let info = Aggregator::new(api.clone(), 0).stop_info("100").await;
        assert_eq!(info.bus_lines.len(), 2);
        assert_eq!(*api.calls.lock().unwrap(), vec![9, 3]);
    }

    #[tokio::test]
    async fn test_oversized_concurrency_is_capped() {
        let s = stop(vec![forecast(1, 7, 1.0)]);
        let api = fake(Some(s), vec![route(7, vec![])]);

        let aggregator = Aggregator::new(api, usize::MAX);
        assert_eq!(aggregator.route_fetch_concurrency, Semaphore::MAX_PERMITS);

        let info = aggregator.stop_info("100").await;
        assert_eq!(info.bus_lines.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_route_fetch_yields_zero_valued_line() {
        let s = stop(vec![forecast(1, 7, 10.0), forecast(2, 404, 20.0)]);
        let api = fake(
            Some(s),
            vec![route(7, vec![vehicle(1, "1.31", "103.8", 20.0, "20")])],
        );

        let info = Aggregator::new(api, 2).stop_info("100").await;
        assert_eq!(info.bus_lines.len(), 2);
        assert_eq!(info.bus_lines[0].id, 7);
        assert_eq!(info.bus_lines[1], BusLineInfo::default());
    }

    #[tokio::test]
    async fn test_failed_stop_fetch_yields_empty_info() {
        let api = fake(None, vec![route(7, vec![])]);

        let info = Aggregator::new(api.clone(), 2).stop_info("100").await;
        assert_eq!(info, StopInfo::default());
        assert!(api.calls.lock().unwrap().is_empty());
    }
}
