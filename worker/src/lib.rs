pub mod axum_http;
pub mod config;
pub mod scheduler;
