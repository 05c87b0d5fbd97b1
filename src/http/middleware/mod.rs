//! Middleware layers.

pub mod mirror;

pub use mirror::{mirror_middleware, SatelliteMirror};
