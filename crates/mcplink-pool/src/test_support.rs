//! In-process MCP server and transport factory for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcplink_core::{ConfigError, ServerConfig, TransportType};
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};

use crate::client::{McpClient, McpClientHandler};
use crate::error::{PoolError, PoolResult};
use crate::transport::{Transport, TransportFactory};

#[derive(Clone, Default)]
pub struct TestServer {
    tools_delay: Option<Duration>,
    fail_tools: bool,
}

impl TestServer {
    pub fn with_tools_delay(mut self, delay: Duration) -> Self {
        self.tools_delay = Some(delay);
        self
    }

    pub fn failing_tools(mut self) -> Self {
        self.fail_tools = true;
        self
    }
}

impl ServerHandler for TestServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "unit-test-server".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        if let Some(delay) = self.tools_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_tools {
            return Err(McpError::internal_error("tools unavailable", None));
        }
        let schema: Arc<JsonObject> = Arc::new(
            serde_json::from_value(serde_json::json!({"type": "object", "properties": {}})).unwrap(),
        );
        Ok(ListToolsResult::with_all_items(vec![Tool::new("echo", "Echo a value", schema)]))
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Called: {}",
            params.name
        ))]))
    }

    async fn list_resources(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resource: Resource =
            serde_json::from_value(serde_json::json!({"uri": "mem://readme", "name": "readme"})).unwrap();
        Ok(ListResourcesResult::with_all_items(vec![resource]))
    }

    async fn list_prompts(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(Vec::new()))
    }
}

/// Factory that wires each connect to a fresh in-memory server
#[derive(Clone)]
pub struct DuplexFactory {
    server: TestServer,
    connects: Arc<AtomicUsize>,
}

impl DuplexFactory {
    pub fn new(server: TestServer) -> Arc<Self> {
        Arc::new(Self {
            server,
            connects: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl TransportFactory for DuplexFactory {
    fn create(&self, config: &ServerConfig) -> Result<Box<dyn Transport>, ConfigError> {
        Ok(Box::new(DuplexTransport {
            factory: self.clone(),
            transport_type: config.transport_type.unwrap_or(TransportType::StreamableHttp),
        }))
    }
}

struct DuplexTransport {
    factory: DuplexFactory,
    transport_type: TransportType,
}

#[async_trait]
impl Transport for DuplexTransport {
    async fn connect(&self, handler: McpClientHandler) -> PoolResult<McpClient> {
        self.factory.connects.fetch_add(1, Ordering::SeqCst);
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let server = self.factory.server.clone();
        tokio::spawn(async move {
            if let Ok(running) = server.serve(server_io).await {
                let _ = running.waiting().await;
            }
        });
        handler
            .serve(client_io)
            .await
            .map_err(|e| PoolError::connection("duplex", e.to_string()))
    }

    fn transport_type(&self) -> TransportType {
        self.transport_type
    }

    fn description(&self) -> String {
        "duplex".to_string()
    }
}
