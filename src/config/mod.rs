//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (APP_ENV, PORT, ...)
//!     → validation.rs (semantic checks)
//!     → ApiConfig (validated, immutable)
//!     → cloned into the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ApiConfig;
pub use schema::Environment;
pub use schema::ObservabilityConfig;
pub use schema::RateLimitConfig;
pub use schema::SecurityConfig;
pub use schema::ServerConfig;
pub use schema::TimeoutConfig;
