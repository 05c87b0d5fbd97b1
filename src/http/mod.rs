//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → middleware/mirror.rs (method filter, request snapshot, emitter decoration)
//!     → application handler (answers through a Res handle)
//!     → response.rs (emitter chain: Mirror → Direct)
//!     → Send to client; notification dispatched to the satellite
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{mirror_middleware, SatelliteMirror};
pub use request::{QueryValue, RequestSnapshot};
pub use response::{Chunk, Direct, Emitter, Payload, Res, ResponseEmitter};
pub use server::HttpServer;
