//! Transport abstraction for MCP connections
//!
//! Each [`Transport`] knows how to reach one server over one protocol and
//! returns a client that has completed the initialize handshake. The
//! [`TransportFactory`] seam lets callers (and tests) decide how a server
//! record becomes a transport.

mod http;
mod sse;
mod stdio;

use std::collections::HashMap;

use async_trait::async_trait;
use mcplink_core::{ConfigError, ServerConfig, TransportType};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub use http::StreamableHttpTransport;
pub use sse::{open_sse_channel, SseTransport};
pub use stdio::{parse_command, StdioTransport};

use crate::client::{McpClient, McpClientHandler};
use crate::error::{PoolError, PoolResult};

/// Transport trait for MCP connections
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection and run the initialize handshake
    async fn connect(&self, handler: McpClientHandler) -> PoolResult<McpClient>;

    fn transport_type(&self) -> TransportType;

    /// Description for logging
    fn description(&self) -> String;
}

/// Turns a validated server record into a transport
pub trait TransportFactory: Send + Sync {
    fn create(&self, config: &ServerConfig) -> Result<Box<dyn Transport>, ConfigError>;
}

/// Builds the real stdio / SSE / streamable HTTP transports
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransportFactory;

impl TransportFactory for DefaultTransportFactory {
    fn create(&self, config: &ServerConfig) -> Result<Box<dyn Transport>, ConfigError> {
        let transport_type = config
            .transport_type
            .ok_or(ConfigError::MissingField("transportType"))?;

        match transport_type {
            TransportType::Stdio => {
                let command = config
                    .command
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or(ConfigError::MissingField("command"))?;
                let (command, args) = parse_command(command, &config.arg_list())?;
                Ok(Box::new(StdioTransport::new(
                    &config.id,
                    &config.name,
                    command,
                    args,
                    config.env.clone(),
                )))
            }
            TransportType::Sse => Ok(Box::new(SseTransport::new(
                &config.id,
                &config.name,
                parse_url(config)?,
                config.effective_headers(),
            ))),
            TransportType::StreamableHttp => Ok(Box::new(StreamableHttpTransport::new(
                &config.id,
                &config.name,
                parse_url(config)?,
                config.effective_headers(),
                config.session_id.clone(),
            ))),
        }
    }
}

fn parse_url(config: &ServerConfig) -> Result<url::Url, ConfigError> {
    let raw = config
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(ConfigError::MissingField("url"))?;
    url::Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Convert operator headers into a reqwest header map
pub fn build_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut header_map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
            name: key.clone(),
            reason: e.to_string(),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
            name: key.clone(),
            reason: e.to_string(),
        })?;
        header_map.insert(name, value);
    }
    Ok(header_map)
}

/// Build a reqwest client that sends `headers` on every request
pub(crate) fn build_http_client(headers: HeaderMap) -> PoolResult<reqwest::Client> {
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(PoolError::from)
}
