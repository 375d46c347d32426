//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config value built in code (defaults)
//!     → loader.rs (merge config file, JSON or TOML)
//!     → loader.rs (overlay env vars for known keys, a.b → A__B)
//!     → validation.rs (required fields still unset)
//!     → config (validated, immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - A missing config file is not an error; a malformed one is
//! - Required fields are declared per type, no reflection

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with_env, load_into, ConfigError, ConfigLocation};
pub use schema::{CoreConfig, CoreEnv, HealthSettings, Profile, SentryEnv};
pub use validation::{IsUnset, MissingField, Required};
