use thiserror::Error;

/// A server configuration that cannot be turned into a connection.
///
/// Raised before any transport is constructed; nothing has touched the
/// network when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// One or more validation rules failed
    #[error("Invalid server configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown transport type: {0}")]
    UnknownTransport(String),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
