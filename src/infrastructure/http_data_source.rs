// reqwest-backed data source
use crate::application::data_source::{DataSource, FetchError};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Request(format!("invalid JSON response: {}", e)))
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_builder() {
        FetchError::Request(error.to_string())
    } else {
        tracing::debug!("No response received: {}", error);
        FetchError::Network
    }
}
