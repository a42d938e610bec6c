// IndianAPI upstream client used by the proxy routes
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndianApiEndpoint {
    FiftyTwoWeek,
    Trending,
}

impl IndianApiEndpoint {
    fn path(&self) -> &'static str {
        match self {
            IndianApiEndpoint::FiftyTwoWeek => "fetch_52_week_high_low_data",
            IndianApiEndpoint::Trending => "trending",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IndianApiEndpoint::FiftyTwoWeek => "52-week",
            IndianApiEndpoint::Trending => "trending",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("INDIANAPI_API_KEY is not configured on the server")]
    MissingApiKey,

    #[error("Failed to fetch data from IndianAPI {} endpoint", .0.display_name())]
    Upstream(IndianApiEndpoint),
}

#[derive(Debug, Clone)]
pub struct IndianApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl IndianApiClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Forward a GET to the upstream endpoint and return its JSON verbatim.
    pub async fn fetch(&self, endpoint: IndianApiEndpoint) -> Result<Value, ProxyError> {
        let api_key = self.api_key.as_deref().ok_or(ProxyError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, endpoint.path());

        let result = async {
            let response = self
                .client
                .get(&url)
                .header(ACCEPT, "application/json")
                .header(API_KEY_HEADER, api_key)
                .send()
                .await?
                .error_for_status()?;
            response.json::<Value>().await
        }
        .await;

        result.map_err(|e| {
            tracing::error!(
                "Error fetching IndianAPI {} data: {}",
                endpoint.display_name(),
                e
            );
            ProxyError::Upstream(endpoint)
        })
    }
}
