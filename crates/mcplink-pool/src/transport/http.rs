//! Streamable HTTP transport for MCP servers

use std::collections::HashMap;

use async_trait::async_trait;
use mcplink_core::{ConfigError, TransportType};
use reqwest::header::{HeaderName, HeaderValue};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ServiceExt;
use tracing::{debug, info};
use url::Url;

use super::{build_header_map, build_http_client, Transport};
use crate::client::{McpClient, McpClientHandler};
use crate::error::{PoolError, PoolResult};

const SESSION_ID_HEADER: &str = "mcp-session-id";

/// Streamable HTTP transport.
///
/// Custom headers are installed as client defaults so they accompany the
/// initialize POST and every later request. A configured session id is
/// sent the same way to resume an existing server session.
pub struct StreamableHttpTransport {
    server_id: String,
    server_name: String,
    url: Url,
    headers: HashMap<String, String>,
    session_id: Option<String>,
}

impl StreamableHttpTransport {
    pub fn new(
        server_id: &str,
        server_name: &str,
        url: Url,
        headers: HashMap<String, String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            server_id: server_id.to_string(),
            server_name: server_name.to_string(),
            url,
            headers,
            session_id: session_id.filter(|s| !s.trim().is_empty()),
        }
    }

    fn default_headers(&self) -> Result<reqwest::header::HeaderMap, ConfigError> {
        let mut header_map = build_header_map(&self.headers)?;
        if let Some(session_id) = &self.session_id {
            let value = HeaderValue::from_str(session_id).map_err(|e| ConfigError::InvalidHeader {
                name: SESSION_ID_HEADER.to_string(),
                reason: e.to_string(),
            })?;
            header_map.insert(HeaderName::from_static(SESSION_ID_HEADER), value);
        }
        Ok(header_map)
    }
}

#[async_trait]
impl Transport for StreamableHttpTransport {
    async fn connect(&self, handler: McpClientHandler) -> PoolResult<McpClient> {
        let header_map = self.default_headers()?;
        debug!(
            server_id = %self.server_id,
            header_count = header_map.len(),
            resuming = self.session_id.is_some(),
            "Connecting to Streamable HTTP server"
        );

        let client = build_http_client(header_map)?;
        let transport_config = StreamableHttpClientTransportConfig::with_uri(self.url.as_str());
        let transport = StreamableHttpClientTransport::with_client(client, transport_config);

        let client = handler.serve(transport).await.map_err(|e| {
            PoolError::connection(&self.server_name, format!("MCP handshake failed: {}", e))
        })?;

        info!(server_id = %self.server_id, url = %self.url, "Streamable HTTP server connected");
        Ok(client)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::StreamableHttp
    }

    fn description(&self) -> String {
        format!("streamable-http:{}", self.url)
    }
}
