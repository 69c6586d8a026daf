//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → ServiceBuilder::from_config + start address
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; certificate rotation is not supported
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError, ConfigOverrides};
pub use schema::{ObservabilityConfig, ServiceConfig, ShutdownConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
