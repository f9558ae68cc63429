//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable)
//!     → consumed once by Dispatcher::build
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - A bad upstream URL is not a config error: that group fails to
//!   load and degrades on its own

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BodyConfig, CorsConfig, DispatcherConfig, Environment, ListenerConfig, ObservabilityConfig,
    RouteGroupConfig,
};
