//! Connection manager error types.

use std::time::Duration;

use mcplink_core::ConfigError;
use rmcp::service::ServiceError;
use thiserror::Error;

pub type PoolResult<T> = Result<T, PoolError>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport could not be established or failed its smoke test.
    /// Any half-open client has already been closed when this is returned.
    #[error("Failed to connect to MCP server '{server_name}': {message}")]
    Connection {
        server_name: String,
        message: String,
    },

    #[error("Proxy for MCP server '{server_name}' is unavailable: {message}")]
    ProxyUnavailable {
        server_name: String,
        message: String,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("MCP request failed: {0}")]
    Service(#[from] ServiceError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl PoolError {
    pub(crate) fn connection(server_name: &str, message: impl Into<String>) -> Self {
        PoolError::Connection {
            server_name: server_name.to_string(),
            message: message.into(),
        }
    }

    /// Configuration problems are the caller's to fix; retrying cannot help
    pub fn is_config_error(&self) -> bool {
        matches!(self, PoolError::Config(_))
    }
}
