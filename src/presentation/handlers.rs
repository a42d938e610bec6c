// HTTP request handlers
use crate::application::api_templates::{ApiConfig, all_api_configs};
use crate::application::widget_renderer::ViewOptions;
use crate::application::widget_service::{Exploration, NewWidget, RenderedWidget, WidgetUpdate};
use crate::domain::dashboard::{DashboardState, Theme};
use crate::domain::widget::Widget;
use crate::infrastructure::http_response::ApiError;
use crate::infrastructure::indian_api::IndianApiEndpoint;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const EXPORT_FILE_NAME: &str = "finboard-config.json";

type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreRequest {
    pub url: String,
    #[serde(default)]
    pub arrays_only: bool,
    pub query: Option<String>,
}

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

#[derive(Deserialize)]
pub struct LayoutRequest {
    pub layout: Vec<String>,
}

#[derive(Deserialize)]
pub struct ViewQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct ClearCacheRequest {
    pub url: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn indianapi_52week(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    Ok(Json(state.indian_api.fetch(IndianApiEndpoint::FiftyTwoWeek).await?))
}

pub async fn indianapi_trending(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    Ok(Json(state.indian_api.fetch(IndianApiEndpoint::Trending).await?))
}

/// Template catalogue, with example URLs filled in when a key is supplied
pub async fn list_templates(Query(query): Query<TemplateQuery>) -> Json<Vec<ApiConfig>> {
    let configs = all_api_configs();
    match query.api_key.filter(|key| !key.trim().is_empty()) {
        Some(key) => Json(configs.into_iter().map(|c| c.with_api_key(&key)).collect()),
        None => Json(configs),
    }
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardState> {
    Json(state.store.snapshot().await)
}

pub async fn export_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let document = state.store.export().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        document,
    ))
}

pub async fn import_dashboard(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<DashboardState>> {
    let imported = state.store.import(&body).await?;
    state.scheduler.sync().await;
    Ok(Json(imported))
}

pub async fn set_theme(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThemeRequest>,
) -> Json<Value> {
    state.store.set_theme(request.theme).await;
    Json(json!({ "theme": request.theme }))
}

pub async fn toggle_theme(State(state): State<Arc<AppState>>) -> Json<Value> {
    let theme = state.store.toggle_theme().await;
    Json(json!({ "theme": theme }))
}

pub async fn reorder_widgets(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LayoutRequest>,
) -> ApiResult<Json<Value>> {
    state.store.reorder(request.layout).await?;
    Ok(Json(json!({ "layout": state.store.snapshot().await.layout })))
}

/// Connect to an API and list the fields it exposes
pub async fn explore_api(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExploreRequest>,
) -> ApiResult<Json<Exploration>> {
    let exploration = state
        .widget_service
        .test_connection(&request.url, request.arrays_only, request.query.as_deref())
        .await?;
    Ok(Json(exploration))
}

/// Check that a URL answers with JSON, bypassing the cache
pub async fn validate_api(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Json<Value> {
    let valid = state.cache.validate_url(&request.url).await;
    Json(json!({ "url": request.url, "valid": valid }))
}

pub async fn create_widget(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewWidget>,
) -> ApiResult<(StatusCode, Json<Widget>)> {
    let widget = state.widget_service.create_widget(request).await?;
    Ok((StatusCode::CREATED, Json(widget)))
}

pub async fn update_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<WidgetUpdate>,
) -> ApiResult<Json<Widget>> {
    Ok(Json(state.widget_service.configure_widget(&id, update).await?))
}

pub async fn remove_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.widget_service.remove_widget(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Widget>> {
    Ok(Json(state.widget_service.refresh(&id).await?))
}

pub async fn widget_view(
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RenderedWidget>> {
    let options = ViewOptions {
        search: query.search,
        page: query.page,
    };
    Ok(Json(state.widget_service.view(&id, &options).await?))
}

/// Invalidate one URL, or the whole cache when the body is empty or names
/// no URL. A body that is not a valid request is rejected.
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<Value>> {
    let url = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<ClearCacheRequest>(&body)?.url
    };

    Ok(match url {
        Some(url) => {
            let removed = state.cache.invalidate(&url).await;
            Json(json!({ "cleared": if removed { 1 } else { 0 } }))
        }
        None => {
            let count = state.cache.len().await;
            state.cache.clear().await;
            Json(json!({ "cleared": count }))
        }
    })
}
