//! Satellite notification subsystem.
//!
//! # Data Flow
//! ```text
//! Mirror emitter (per emission call)
//!     → notification.rs (Notification { req, res })
//!     → client.rs (Sink::dispatch)
//!     → detached task POSTs to {satellite_host}/requests
//! ```
//!
//! # Design Decisions
//! - Best-effort: no retry, no queue, no back-pressure
//! - Failures are logged and counted, never returned

pub mod client;
pub mod notification;

pub use client::{requests_endpoint, SatelliteClient, SatelliteError, Sink};
pub use notification::{Notification, ResponseSnapshot};
