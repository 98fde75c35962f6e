pub mod analysis_export;
pub mod analytics;
pub mod api;
pub mod athlete;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod model;
pub mod parse;
pub mod schedule;
pub mod standings;
pub mod status;
