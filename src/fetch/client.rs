use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared upstream request.
///
/// Kept as a trait so tests and wrappers can stand in for the real client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
