// HTTP response utilities for JSON error bodies
use crate::application::dashboard_store::StoreError;
use crate::application::data_source::FetchError;
use crate::application::widget_service::WidgetError;
use crate::domain::dashboard::DashboardError;
use crate::infrastructure::indian_api::ProxyError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Build a `{"error": message}` response.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Error surfaced by an HTTP handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(e) => store_status(e),
            ApiError::Widget(WidgetError::Store(e)) => store_status(e),
            ApiError::Widget(WidgetError::Fetch(_)) | ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Widget(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Proxy(ProxyError::MissingApiKey) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Proxy(ProxyError::Upstream(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

fn store_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::DuplicateWidget(_) => StatusCode::CONFLICT,
        StoreError::WidgetNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidLayout
        | StoreError::Dashboard(DashboardError::Format(_))
        | StoreError::Dashboard(DashboardError::Parse(_)) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, self);
        }
        json_error(status, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::indian_api::IndianApiEndpoint;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Store(StoreError::WidgetNotFound("w".into())), StatusCode::NOT_FOUND),
            (ApiError::Store(StoreError::DuplicateWidget("w".into())), StatusCode::CONFLICT),
            (ApiError::Store(StoreError::InvalidLayout), StatusCode::BAD_REQUEST),
            (ApiError::Fetch(FetchError::Network), StatusCode::BAD_GATEWAY),
            (ApiError::Proxy(ProxyError::MissingApiKey), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::Proxy(ProxyError::Upstream(IndianApiEndpoint::Trending)),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::Widget(WidgetError::MissingName), StatusCode::BAD_REQUEST),
            (
                ApiError::InvalidBody(serde_json::from_str::<u8>("x").unwrap_err()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
