// Built-in API template catalogue
use crate::domain::widget::WidgetType;
use serde::Serialize;

pub const INDIAN_API_PROVIDER: &str = "indianapi";
const INDIAN_API_KEY_PLACEHOLDER: &str = "YOUR_INDIAN_API_KEY";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub name: &'static str,
    pub provider: &'static str,
    pub base_url: &'static str,
    pub requires_api_key: bool,
    pub api_key_placeholder: &'static str,
    pub rate_limit: Option<&'static str>,
    pub documentation: &'static str,
    pub examples: Vec<ApiExample>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiExample {
    pub name: &'static str,
    pub description: &'static str,
    pub url: String,
    pub widget_type: WidgetType,
}

fn example(name: &'static str, description: &'static str, url: &'static str, widget_type: WidgetType) -> ApiExample {
    ApiExample {
        name,
        description,
        url: url.to_string(),
        widget_type,
    }
}

impl ApiConfig {
    /// Fill the key into every example URL.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        for example in &mut self.examples {
            example.url = replace_api_key(&example.url, api_key, self.provider);
        }
        self
    }
}

pub fn indian_api_config() -> ApiConfig {
    ApiConfig {
        name: "IndianAPI",
        provider: INDIAN_API_PROVIDER,
        base_url: "https://api.indianapi.in",
        requires_api_key: true,
        api_key_placeholder: INDIAN_API_KEY_PLACEHOLDER,
        rate_limit: Some("Varies by plan"),
        documentation: "https://indianapi.in/docs",
        examples: vec![
            example(
                "Stock Quote (NSE) - RELIANCE",
                "Get NSE stock quote for Reliance Industries",
                "https://api.indianapi.in/v1/stock/quote?symbol=RELIANCE&exchange=NSE&apikey=YOUR_INDIAN_API_KEY",
                WidgetType::FinanceCard,
            ),
            example(
                "Stock Quote (NSE) - TCS",
                "Get NSE stock quote for Tata Consultancy Services",
                "https://api.indianapi.in/v1/stock/quote?symbol=TCS&exchange=NSE&apikey=YOUR_INDIAN_API_KEY",
                WidgetType::FinanceCard,
            ),
            example(
                "Stock Quote (BSE)",
                "Get BSE stock quote for Reliance",
                "https://api.indianapi.in/v1/stock/quote?symbol=RELIANCE&exchange=BSE&apikey=YOUR_INDIAN_API_KEY",
                WidgetType::FinanceCard,
            ),
            example(
                "Market Gainers",
                "Top gaining stocks in Indian market",
                "https://api.indianapi.in/v1/market/gainers?apikey=YOUR_INDIAN_API_KEY",
                WidgetType::Table,
            ),
            example(
                "Market Losers",
                "Top losing stocks in Indian market",
                "https://api.indianapi.in/v1/market/losers?apikey=YOUR_INDIAN_API_KEY",
                WidgetType::Table,
            ),
        ],
    }
}

pub fn all_api_configs() -> Vec<ApiConfig> {
    vec![indian_api_config()]
}

/// Substitute the provider's key placeholder in a template URL. The key is
/// percent-encoded.
pub fn replace_api_key(url: &str, api_key: &str, provider: &str) -> String {
    if provider == INDIAN_API_PROVIDER {
        url.replacen(INDIAN_API_KEY_PLACEHOLDER, &urlencoding::encode(api_key), 1)
    } else {
        url.to_string()
    }
}
