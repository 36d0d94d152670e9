//! # McpLink Core Library
//!
//! Domain types and rules for the MCP connection manager.
//!
//! ## Modules
//!
//! - `domain` - Server configuration records and probe/status results
//! - `validation` - Synchronous configuration rule checker
//! - `settings` - Manager tuning (staleness, sweep interval, timeouts)
//! - `error` - Configuration error taxonomy

pub mod domain;
pub mod error;
pub mod settings;
pub mod validation;

pub use domain::*;
pub use error::ConfigError;
pub use settings::ManagerSettings;
pub use validation::{validate_custom_headers, validate_server_config, ValidationResult};
