//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware + satellite client produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (notification counters)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
