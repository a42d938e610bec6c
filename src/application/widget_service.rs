// Widget service - Add, configure, explore and view flows
use crate::application::dashboard_store::{DashboardStore, StoreError};
use crate::application::data_source::FetchError;
use crate::application::field_explorer::{explore_options, filter_fields, suggest_fields};
use crate::application::refresh_scheduler::{RefreshScheduler, refresh_widget};
use crate::application::response_cache::{Clock, ResponseCache};
use crate::application::widget_renderer::{ViewOptions, WidgetView, render};
use crate::domain::field::{FieldDescriptor, FieldOption};
use crate::domain::widget::{ChartInterval, ChartType, DisplayMode, Widget, WidgetType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("Please enter widget name")]
    MissingName,

    #[error("Please enter API URL")]
    MissingUrl,

    #[error("Could not detect any fields in the API response.")]
    NoFieldsFound,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Payload of the add-widget flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWidget {
    pub name: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub api_url: String,
    #[serde(rename = "refreshInterval", default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub fields: Option<Vec<FieldDescriptor>>,
    #[serde(default)]
    pub display_mode: Option<DisplayMode>,
    #[serde(default)]
    pub chart_type: Option<ChartType>,
    #[serde(default)]
    pub chart_interval: Option<ChartInterval>,
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

/// Payload of the configure flow; absent members are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetUpdate {
    pub name: Option<String>,
    pub api_url: Option<String>,
    #[serde(rename = "refreshInterval")]
    pub refresh_interval_secs: Option<u64>,
    pub fields: Option<Vec<FieldDescriptor>>,
    pub display_mode: Option<DisplayMode>,
    pub chart_type: Option<ChartType>,
    pub chart_interval: Option<ChartInterval>,
    pub config: Option<Map<String, Value>>,
}

/// Result of probing an API URL for the field picker.
#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub data: Value,
    pub timestamp: i64,
    pub fields: Vec<FieldOption>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedWidget {
    pub widget: Widget,
    pub view: WidgetView,
    pub cached: bool,
}

#[derive(Clone)]
pub struct WidgetService {
    cache: Arc<ResponseCache>,
    store: Arc<DashboardStore>,
    scheduler: Arc<RefreshScheduler>,
    clock: Arc<dyn Clock>,
    default_ttl_ms: u64,
}

impl WidgetService {
    pub fn new(
        cache: Arc<ResponseCache>,
        store: Arc<DashboardStore>,
        scheduler: Arc<RefreshScheduler>,
        clock: Arc<dyn Clock>,
        default_ttl_ms: u64,
    ) -> Self {
        Self {
            cache,
            store,
            scheduler,
            clock,
            default_ttl_ms,
        }
    }

    /// Fetch `url` without the cache and list the fields it exposes.
    pub async fn test_connection(
        &self,
        url: &str,
        arrays_only: bool,
        query: Option<&str>,
    ) -> Result<Exploration, WidgetError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(WidgetError::MissingUrl);
        }

        let response = self.cache.fetch(url, 0).await?;
        let options = explore_options(&response.data, &[], arrays_only);
        let fields = filter_fields(&options, query.unwrap_or_default())
            .into_iter()
            .cloned()
            .collect();

        Ok(Exploration {
            data: response.data,
            timestamp: response.timestamp,
            fields,
        })
    }

    pub async fn create_widget(&self, request: NewWidget) -> Result<Widget, WidgetError> {
        let name = request.name.trim().to_string();
        let api_url = request.api_url.trim().to_string();
        if name.is_empty() {
            return Err(WidgetError::MissingName);
        }
        if api_url.is_empty() {
            return Err(WidgetError::MissingUrl);
        }

        let fields = match request.fields.filter(|fields| !fields.is_empty()) {
            Some(fields) => fields,
            None => {
                let response = self.cache.fetch(&api_url, 0).await?;
                suggest_fields(&response.data)
            }
        };
        if fields.is_empty() {
            return Err(WidgetError::NoFieldsFound);
        }

        let mut widget = Widget::new(
            self.next_widget_id().await,
            name.clone(),
            request.widget_type,
            api_url,
            request.refresh_interval_secs,
            fields,
        );
        widget.display_mode = request.display_mode;
        widget.chart_type = request.chart_type;
        widget.chart_interval = request.chart_interval;
        widget.last_updated = Some(self.now_rfc3339());
        widget.config.insert(
            "description".to_string(),
            Value::String(format!("{} stocks fetched from API", name)),
        );

        self.store.add_widget(widget.clone()).await?;
        self.scheduler.sync().await;
        tracing::info!("Added widget {} ({})", widget.id, widget.name);
        Ok(widget)
    }

    pub async fn configure_widget(&self, id: &str, update: WidgetUpdate) -> Result<Widget, WidgetError> {
        let mut widget = self
            .store
            .get_widget(id)
            .await
            .ok_or_else(|| StoreError::WidgetNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(WidgetError::MissingName);
            }
            widget.name = name;
        }
        if let Some(api_url) = update.api_url {
            let api_url = api_url.trim().to_string();
            if api_url.is_empty() {
                return Err(WidgetError::MissingUrl);
            }
            widget.api_url = api_url;
        }
        if let Some(secs) = update.refresh_interval_secs {
            widget.refresh_interval_secs = secs;
        }
        if let Some(fields) = update.fields {
            widget.fields = fields;
        }
        if update.display_mode.is_some() {
            widget.display_mode = update.display_mode;
        }
        if update.chart_type.is_some() {
            widget.chart_type = update.chart_type;
        }
        if update.chart_interval.is_some() {
            widget.chart_interval = update.chart_interval;
        }
        if let Some(config) = update.config {
            widget.config.extend(config);
        }

        self.store.update_widget(widget.clone()).await?;
        self.scheduler.sync().await;
        Ok(widget)
    }

    pub async fn remove_widget(&self, id: &str) -> Result<Widget, WidgetError> {
        let removed = self.store.remove_widget(id).await?;
        self.scheduler.sync().await;
        tracing::info!("Removed widget {}", id);
        Ok(removed)
    }

    /// Manual retry: refetch regardless of the freshness window.
    pub async fn refresh(&self, id: &str) -> Result<Widget, WidgetError> {
        let widget = self.require(id).await?;
        self.scheduler.refresh_now(&widget).await?;
        Ok(self.require(id).await?)
    }

    /// Fetch the widget's data through the cache and build its view.
    ///
    /// Polling widgets use their refresh interval as the freshness window;
    /// the others use the configured default.
    pub async fn view(&self, id: &str, options: &ViewOptions) -> Result<RenderedWidget, WidgetError> {
        let widget = self.require(id).await?;
        let ttl_ms = if widget.polls() {
            widget.cache_ttl_ms()
        } else {
            self.default_ttl_ms
        };

        let response = refresh_widget(&self.cache, &self.store, &widget, ttl_ms).await?;
        let view = render(&widget, &response.data, options);
        let widget = self.store.get_widget(id).await.unwrap_or(widget);

        Ok(RenderedWidget {
            widget,
            view,
            cached: response.cached,
        })
    }

    async fn require(&self, id: &str) -> Result<Widget, StoreError> {
        self.store
            .get_widget(id)
            .await
            .ok_or_else(|| StoreError::WidgetNotFound(id.to_string()))
    }

    async fn next_widget_id(&self) -> String {
        let base = format!("widget-{}", self.clock.now_millis());
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.store.contains(&candidate).await {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        candidate
    }

    fn now_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.clock.now_millis())
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
