// Application layer - Use cases and the traits they depend on
pub mod api_templates;
pub mod dashboard_store;
pub mod data_source;
pub mod field_explorer;
pub mod key_value_store;
pub mod refresh_scheduler;
pub mod response_cache;
pub mod value_accessor;
pub mod value_formatter;
pub mod widget_renderer;
pub mod widget_service;
