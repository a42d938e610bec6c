// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_store;
pub mod http_data_source;
pub mod http_response;
pub mod indian_api;
pub mod memory_store;
