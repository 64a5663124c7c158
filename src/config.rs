//! Runtime settings for the upstream client and the aggregation engine.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::aggregator::engine::Aggregator;
use crate::fetch::BasicClient;
use crate::infra::baseride::{BaserideClient, DEFAULT_BASE_URL};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub upstream_base_url: String,
    /// Whole-request timeout for each upstream call.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Maximum route variant fetches in flight per request. 1 fetches them
    /// one after another.
    pub route_fetch_concurrency: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            route_fetch_concurrency: 4,
        }
    }
}

impl AggregatorConfig {
    /// Builds the HTTP client, the Baseride adapter and the engine on top.
    pub fn build_aggregator(&self) -> Result<Aggregator> {
        let http = BasicClient::with_timeouts(self.timeout, self.connect_timeout)
            .context("Failed to build upstream HTTP client")?;
        let api = BaserideClient::new(http, &self.upstream_base_url)
            .with_context(|| format!("Invalid upstream base URL '{}'", self.upstream_base_url))?;

        Ok(Aggregator::new(Arc::new(api), self.route_fetch_concurrency))
    }
}
