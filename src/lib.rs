//! Catalog API library: users and products over a validated JSON REST surface.

pub mod api;
pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;
pub mod validation;

pub use config::schema::ApiConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
