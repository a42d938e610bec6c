// Widget domain model
use super::field::FieldDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetType {
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "finance-card")]
    FinanceCard,
    #[serde(rename = "chart")]
    Chart,
    #[serde(rename = "chartjs")]
    ChartJs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Card,
    Table,
    Chart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Candle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartInterval {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub api_url: String,
    /// Seconds between refreshes; 0 disables polling.
    #[serde(rename = "refreshInterval", default)]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_interval: Option<ChartInterval>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Widget {
    pub fn new(
        id: String,
        name: String,
        widget_type: WidgetType,
        api_url: String,
        refresh_interval_secs: u64,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            id,
            name,
            widget_type,
            api_url,
            refresh_interval_secs,
            fields,
            display_mode: None,
            chart_type: None,
            chart_interval: None,
            config: Map::new(),
            last_updated: None,
            error: None,
        }
    }

    pub fn polls(&self) -> bool {
        self.refresh_interval_secs > 0
    }

    /// Freshness window handed to the response cache for this widget.
    pub fn cache_ttl_ms(&self) -> u64 {
        self.refresh_interval_secs.saturating_mul(1000)
    }

    #[cfg(test)]
    pub fn description(&self) -> Option<&str> {
        self.config.get("description").and_then(Value::as_str)
    }
}
