// Data source trait for outbound JSON fetches
use async_trait::async_trait;
use serde_json::Value;

/// Classified failure of an outbound fetch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("API Error: {status} - {reason}")]
    Status { status: u16, reason: String },

    /// No response was received (connect failure or timeout).
    #[error("Network Error: Unable to reach the API")]
    Network,

    /// The request could not be built or the body was not JSON.
    #[error("Request Error: {0}")]
    Request(String),
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// GET `url` and decode the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}
