//! Error types for talking to the upstream transit provider.

use thiserror::Error;

/// Failures that can occur while fetching or decoding an upstream resource.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be sent or the body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned status {status}")]
    Status {
        /// The HTTP status code returned
        status: reqwest::StatusCode,
    },

    /// Body was not valid JSON for the expected shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL could not be turned into a request URL
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    /// Short machine-friendly label, used as a structured log field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}
