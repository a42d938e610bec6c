// Presentation layer - HTTP routes
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/indianapi/52week", get(indianapi_52week))
        .route("/api/indianapi/trending", get(indianapi_trending))
        .route("/api/templates", get(list_templates))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/export", get(export_dashboard))
        .route("/api/dashboard/import", post(import_dashboard))
        .route("/api/dashboard/theme", put(set_theme))
        .route("/api/dashboard/theme/toggle", post(toggle_theme))
        .route("/api/dashboard/layout", put(reorder_widgets))
        .route("/api/explore", post(explore_api))
        .route("/api/explore/validate", post(validate_api))
        .route("/api/widgets", post(create_widget))
        .route("/api/widgets/:id", put(update_widget).delete(remove_widget))
        .route("/api/widgets/:id/refresh", post(refresh_widget))
        .route("/api/widgets/:id/view", get(widget_view))
        .route("/api/cache/clear", post(clear_cache))
        .with_state(state)
}
