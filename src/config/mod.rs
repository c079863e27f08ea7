//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! declaration file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → AppConfig::build_registry → HandlerRegistry
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server builds a fresh registry and swaps it atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, HandlerConfig, ModuleConfig, NameResolverKind, OperationConfig, RuleConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
