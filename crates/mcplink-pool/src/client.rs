//! MCP client handler used for every outbound connection
//!
//! Advertises the client identity and capabilities during the initialize
//! handshake and forwards server notifications into the tracing pipeline.

use rmcp::model::{
    ClientCapabilities, ClientInfo, ElicitationCapability, FormElicitationCapability, Implementation,
    LoggingLevel,
};
use rmcp::service::{NotificationContext, RunningService};
use rmcp::RoleClient;
use tracing::{debug, error, info, warn};

/// Type alias for a connected MCP client
pub type McpClient = RunningService<RoleClient, McpClientHandler>;

/// Client handler carrying the identity of the server it talks to
#[derive(Clone)]
pub struct McpClientHandler {
    info: ClientInfo,
    server_id: String,
    server_name: String,
}

impl std::fmt::Debug for McpClientHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClientHandler")
            .field("server_id", &self.server_id)
            .field("server_name", &self.server_name)
            .finish()
    }
}

/// Capabilities sent in the initialize request.
///
/// Form-mode elicitation only. rmcp's `ElicitationCapability` has no
/// `applyDefaults` field, so that flag cannot be advertised.
pub fn client_capabilities() -> ClientCapabilities {
    ClientCapabilities {
        elicitation: Some(ElicitationCapability {
            form: Some(FormElicitationCapability::default()),
            url: None,
        }),
        ..Default::default()
    }
}

impl McpClientHandler {
    pub fn new(server_id: &str, server_name: &str) -> Self {
        Self {
            info: ClientInfo {
                protocol_version: Default::default(),
                capabilities: client_capabilities(),
                client_info: Implementation {
                    name: format!("mcplink-{}", server_id),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    title: Some("McpLink Connection Manager".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
            server_id: server_id.to_string(),
            server_name: server_name.to_string(),
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }
}

impl rmcp::ClientHandler for McpClientHandler {
    fn get_info(&self) -> ClientInfo {
        self.info.clone()
    }

    fn on_tool_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        async move {
            info!(server_id = %self.server_id, "Server sent tools/list_changed");
        }
    }

    fn on_prompt_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        async move {
            info!(server_id = %self.server_id, "Server sent prompts/list_changed");
        }
    }

    fn on_resource_list_changed(
        &self,
        _context: NotificationContext<RoleClient>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        async move {
            info!(server_id = %self.server_id, "Server sent resources/list_changed");
        }
    }

    fn on_logging_message(
        &self,
        params: rmcp::model::LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        async move {
            let message = match &params.data {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let server_id = self.server_id.as_str();
            let logger = params.logger.as_deref().unwrap_or("-");

            match params.level {
                LoggingLevel::Debug => debug!(server_id, logger, "Server log: {}", message),
                LoggingLevel::Info | LoggingLevel::Notice => {
                    info!(server_id, logger, "Server log: {}", message)
                }
                LoggingLevel::Warning => warn!(server_id, logger, "Server log: {}", message),
                LoggingLevel::Error
                | LoggingLevel::Critical
                | LoggingLevel::Alert
                | LoggingLevel::Emergency => error!(server_id, logger, "Server log: {}", message),
            }
        }
    }
}
