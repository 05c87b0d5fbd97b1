//! Satellite mirror: HTTP middleware that mirrors request/response metadata
//! to a remote collection endpoint without changing the response.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod satellite;

pub use config::schema::AppConfig;
pub use http::{mirror_middleware, HttpServer, Res, SatelliteMirror};
pub use lifecycle::Shutdown;
