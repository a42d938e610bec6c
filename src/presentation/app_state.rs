// Application state for HTTP handlers
use crate::application::dashboard_store::DashboardStore;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::response_cache::ResponseCache;
use crate::application::widget_service::WidgetService;
use crate::infrastructure::indian_api::IndianApiClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub widget_service: WidgetService,
    pub store: Arc<DashboardStore>,
    pub cache: Arc<ResponseCache>,
    pub scheduler: Arc<RefreshScheduler>,
    pub indian_api: IndianApiClient,
}
