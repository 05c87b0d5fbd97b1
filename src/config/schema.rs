//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults, so a minimal file only names the satellite.

use serde::{Deserialize, Serialize};

/// Root configuration for the mirrored application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Satellite mirroring settings.
    pub mirror: MirrorConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Where and how request/response notifications are mirrored.
///
/// Immutable once loaded and shared read-only by every request handled
/// through one middleware installation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Base URL of the collection endpoint. Notifications are POSTed to
    /// `{satellite_host}/requests`.
    #[serde(alias = "satelliteHost")]
    pub satellite_host: String,

    /// Timeout for a single notification POST, in seconds.
    pub timeout_secs: u64,

    /// Largest request body (by `content-length`) buffered for the snapshot.
    pub max_body_bytes: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            satellite_host: "http://127.0.0.1:4000".to_string(),
            timeout_secs: 5,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Timeout configuration for the host application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
