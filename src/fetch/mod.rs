mod client;
mod basic;

pub use client::HttpClient;
pub use basic::BasicClient;

use bytes::Bytes;
use reqwest::Url;
use tracing::debug;

use crate::error::UpstreamError;

/// GETs `url` and returns the raw body.
///
/// Non-success statuses are reported as [`UpstreamError::Status`] instead of
/// handing an error page to the decoder.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: Url,
) -> Result<Bytes, UpstreamError> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(UpstreamError::Status { status });
    }

    let body = resp.bytes().await?;
    debug!(bytes = body.len(), "Upstream body received");
    Ok(body)
}
