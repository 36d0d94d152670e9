//! Server configuration validation
//!
//! Every rule runs independently and all violations are reported together,
//! so an operator can fix a record in one pass.

use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionType, CustomHeader, ServerConfig, TransportType};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Convert into a `Result`, aggregating every message into one error
    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.valid {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.errors))
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Check a server record for internal consistency before connecting
pub fn validate_server_config(config: &ServerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    match config.transport_type {
        None => errors.push("Transport type is required".to_string()),
        Some(TransportType::Stdio) => {
            if is_blank(config.command.as_deref()) {
                errors.push("Command is required for STDIO transport".to_string());
            }
            // Child processes are never exposed to direct callers
            if config.connection_type == ConnectionType::Direct {
                errors.push("STDIO transport requires proxy connection".to_string());
            }
        }
        Some(transport @ (TransportType::Sse | TransportType::StreamableHttp)) => {
            if is_blank(config.url.as_deref()) {
                errors.push(format!("URL is required for {} transport", transport.label()));
            }
        }
    }

    if config.connection_type == ConnectionType::Proxy && is_blank(config.proxy_url.as_deref()) {
        errors.push("Proxy URL is required for proxy connection".to_string());
    }

    errors.extend(validate_custom_headers(&config.custom_headers).errors);

    ValidationResult::from_errors(errors)
}

/// Validate operator-supplied headers. Disabled headers are skipped.
pub fn validate_custom_headers(headers: &[CustomHeader]) -> ValidationResult {
    let mut errors = Vec::new();

    for (index, header) in headers.iter().enumerate().filter(|(_, h)| h.enabled) {
        let name = header.name.trim();
        let value = header.value.trim();

        if name.is_empty() {
            errors.push(format!("Header #{}: name is required", index + 1));
            continue;
        }
        if value.is_empty() {
            errors.push(format!("Header '{}': value is required", name));
            continue;
        }
        if name.eq_ignore_ascii_case("authorization") && value.eq_ignore_ascii_case("bearer") {
            errors.push(format!(
                "Header '{}': bearer token is missing (value is just \"Bearer\")",
                name
            ));
        }
    }

    ValidationResult::from_errors(errors)
}
