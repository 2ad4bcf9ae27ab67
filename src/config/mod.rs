//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks, all errors reported)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once during startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults except the listen port
//! - Environment variables win over the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{host_port, ListenerConfig, MetricsConfig, ProxyConfig, RpcConfig, TelemetryConfig};
pub use validation::ValidationError;
