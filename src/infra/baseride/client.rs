use async_trait::async_trait;
use reqwest::Url;

use crate::aggregator::types::{RouteVariantResponse, StopForecastResponse};
use crate::error::UpstreamError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::{parse_route_variant, parse_stop_forecast};
use crate::services::transit_api::TransitApi;

pub const DEFAULT_BASE_URL: &str = "https://baseride.com";

const STOP_FORECAST_PATH: [&str; 3] = ["routes", "api", "platformbusarrival"];
const ROUTE_VARIANT_PATH: [&str; 3] = ["routes", "apigeo", "routevariantvehicle"];

/// [`TransitApi`] backed by the Baseride JSON endpoints.
pub struct BaserideClient<C> {
    http: C,
    base_url: Url,
}

impl<C: HttpClient> BaserideClient<C> {
    pub fn new(http: C, base_url: &str) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    /// `{base}/{prefix..}/{id}/?format=json`, with `id` percent-encoded as a
    /// single path segment.
    ///
    /// `.` and `..` are rejected: URL normalisation would drop them and
    /// silently address the parent resource.
    fn endpoint(&self, prefix: &[&str], id: &str) -> Result<Url, UpstreamError> {
        if id == "." || id == ".." {
            return Err(UpstreamError::InvalidUrl(format!("'{id}' is not a usable id")));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(prefix)
            .push(id)
            .push("");
        url.set_query(Some("format=json"));
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient + 'static> TransitApi for BaserideClient<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_stop_forecast(
        &self,
        stop_id: &str,
    ) -> Result<StopForecastResponse, UpstreamError> {
        let url = self.endpoint(&STOP_FORECAST_PATH, stop_id)?;
        let body = fetch_bytes(&self.http, url).await?;
        parse_stop_forecast(&body)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_route_variant(
        &self,
        rv_id: i64,
    ) -> Result<RouteVariantResponse, UpstreamError> {
        let url = self.endpoint(&ROUTE_VARIANT_PATH, &rv_id.to_string())?;
        let body = fetch_bytes(&self.http, url).await?;
        parse_route_variant(&body)
    }
}
