//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → MirrorConfig handed to the mirror middleware factory
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a new installation is required to change it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ListenerConfig;
pub use schema::MirrorConfig;
pub use schema::ObservabilityConfig;
pub use schema::TimeoutConfig;
