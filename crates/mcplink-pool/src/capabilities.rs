//! Capability listing and multi-server aggregation
//!
//! Listing calls are speculative (UI refreshes, route handlers) so they
//! never fail: errors are logged and folded into empty values. Batch
//! operations report per-server failures as data.

use std::collections::BTreeMap;
use std::fmt;

use futures::future::join_all;
use mcplink_core::ServerConfig;
use rmcp::model::{
    GetPromptRequestParams, GetPromptResult, JsonObject, Prompt, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceTemplate, Tool,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PoolResult;
use crate::manager::{ConnectionManager, SharedClient};

/// Names of everything a server exposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilitiesSummary {
    pub tools: Vec<String>,
    pub resources: Vec<String>,
    pub prompts: Vec<String>,
    pub resource_templates: Vec<String>,
}

pub struct ConnectedServer {
    pub server_id: String,
    pub server_name: String,
    pub client: SharedClient,
}

impl fmt::Debug for ConnectedServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedServer")
            .field("server_id", &self.server_id)
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedConnection {
    pub server_id: String,
    pub server_name: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct ConnectMultipleResult {
    pub successful: Vec<ConnectedServer>,
    pub failed: Vec<FailedConnection>,
}

/// Tools one server contributed to an [`AllToolsResult`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTools {
    pub server_name: String,
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllToolsResult {
    /// Tools keyed by `{serverName}_{toolName}`
    pub combined_tools: BTreeMap<String, Tool>,
    /// Per-server breakdown keyed by server id, tools under their original names
    pub tools_by_server: BTreeMap<String, ServerTools>,
    pub errors: Vec<String>,
}

/// Name a tool in the combined namespace
pub fn prefixed_tool_name(server_name: &str, tool_name: &str) -> String {
    format!("{}_{}", server_name, tool_name)
}

fn fold<T: Default>(result: PoolResult<T>, server_id: &str, operation: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(server_id, operation, "[ConnectionManager] Request failed: {}", e);
        T::default()
    })
}

impl ConnectionManager {
    async fn try_list_tools(&self, config: &ServerConfig, client: &SharedClient) -> PoolResult<Vec<Tool>> {
        self.timed(config, "tools/list", client.list_all_tools()).await
    }

    pub async fn list_tools(&self, config: &ServerConfig) -> Vec<Tool> {
        let Some(client) = self.client_for(config).await else {
            return Vec::new();
        };
        fold(self.try_list_tools(config, &client).await, &config.id, "tools/list")
    }

    pub async fn list_resources(&self, config: &ServerConfig) -> Vec<Resource> {
        let Some(client) = self.client_for(config).await else {
            return Vec::new();
        };
        fold(
            self.timed(config, "resources/list", client.list_all_resources()).await,
            &config.id,
            "resources/list",
        )
    }

    pub async fn list_prompts(&self, config: &ServerConfig) -> Vec<Prompt> {
        let Some(client) = self.client_for(config).await else {
            return Vec::new();
        };
        fold(
            self.timed(config, "prompts/list", client.list_all_prompts()).await,
            &config.id,
            "prompts/list",
        )
    }

    pub async fn list_resource_templates(&self, config: &ServerConfig) -> Vec<ResourceTemplate> {
        let Some(client) = self.client_for(config).await else {
            return Vec::new();
        };
        fold(
            self.timed(
                config,
                "resources/templates/list",
                client.list_all_resource_templates(),
            )
            .await,
            &config.id,
            "resources/templates/list",
        )
    }

    pub async fn get_prompt(
        &self,
        config: &ServerConfig,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Option<GetPromptResult> {
        let client = self.client_for(config).await?;
        let params = GetPromptRequestParams {
            name: name.to_string().into(),
            arguments,
            meta: None,
        };
        fold(
            self.timed(config, "prompts/get", client.get_prompt(params))
                .await
                .map(Some),
            &config.id,
            "prompts/get",
        )
    }

    pub async fn read_resource(&self, config: &ServerConfig, uri: &str) -> Option<ReadResourceResult> {
        let client = self.client_for(config).await?;
        let params = ReadResourceRequestParams {
            uri: uri.to_string().into(),
            meta: None,
        };
        fold(
            self.timed(config, "resources/read", client.read_resource(params))
                .await
                .map(Some),
            &config.id,
            "resources/read",
        )
    }

    /// Names of tools, resources, prompts and resource templates.
    ///
    /// One client lookup (connecting at most once), then the four listings
    /// run concurrently on that client.
    pub async fn get_server_capabilities(&self, config: &ServerConfig) -> ServerCapabilitiesSummary {
        let Some(client) = self.client_for(config).await else {
            return ServerCapabilitiesSummary::default();
        };

        let (tools, resources, prompts, templates) = tokio::join!(
            self.try_list_tools(config, &client),
            self.timed(config, "resources/list", client.list_all_resources()),
            self.timed(config, "prompts/list", client.list_all_prompts()),
            self.timed(
                config,
                "resources/templates/list",
                client.list_all_resource_templates()
            ),
        );

        ServerCapabilitiesSummary {
            tools: fold(tools, &config.id, "tools/list")
                .into_iter()
                .map(|t| t.name.to_string())
                .collect(),
            resources: fold(resources, &config.id, "resources/list")
                .into_iter()
                .map(|r| r.raw.name.to_string())
                .collect(),
            prompts: fold(prompts, &config.id, "prompts/list")
                .into_iter()
                .map(|p| p.name.to_string())
                .collect(),
            resource_templates: fold(templates, &config.id, "resources/templates/list")
                .into_iter()
                .map(|t| t.raw.name.to_string())
                .collect(),
        }
    }

    /// Connect every server concurrently; failures are reported, not raised
    pub async fn connect_multiple(&self, servers: &[ServerConfig]) -> ConnectMultipleResult {
        let attempts = join_all(servers.iter().map(|config| async move {
            (config, self.connect(config).await)
        }))
        .await;

        let mut result = ConnectMultipleResult::default();
        for (config, attempt) in attempts {
            match attempt {
                Ok(client) => result.successful.push(ConnectedServer {
                    server_id: config.id.clone(),
                    server_name: config.name.clone(),
                    client,
                }),
                Err(e) => {
                    warn!(server_id = %config.id, "[ConnectionManager] connect_multiple: {}", e);
                    result.failed.push(FailedConnection {
                        server_id: config.id.clone(),
                        server_name: config.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        result
    }

    /// Collect tools from every server into one namespace.
    ///
    /// One server failing leaves an error entry for it; the others still
    /// contribute.
    pub async fn get_all_tools(&self, servers: &[ServerConfig]) -> AllToolsResult {
        let connected = self.connect_multiple(servers).await;
        let mut result = AllToolsResult::default();

        for failed in connected.failed {
            result
                .errors
                .push(format!("{}: {}", failed.server_name, failed.error));
            result.tools_by_server.insert(
                failed.server_id,
                ServerTools {
                    server_name: failed.server_name,
                    tools: Vec::new(),
                    error: Some(failed.error),
                },
            );
        }

        let listings = join_all(connected.successful.iter().map(|server| async move {
            let config = servers.iter().find(|c| c.id == server.server_id);
            let tools = match config {
                Some(config) => self.try_list_tools(config, &server.client).await,
                None => Ok(Vec::new()),
            };
            (server, tools)
        }))
        .await;

        for (server, tools) in listings {
            match tools {
                Ok(tools) => {
                    debug!(
                        server_id = %server.server_id,
                        count = tools.len(),
                        "[ConnectionManager] Collected tools"
                    );
                    for tool in &tools {
                        let name = prefixed_tool_name(&server.server_name, &tool.name);
                        let mut renamed = tool.clone();
                        renamed.name = name.clone().into();
                        result.combined_tools.insert(name, renamed);
                    }
                    result.tools_by_server.insert(
                        server.server_id.clone(),
                        ServerTools {
                            server_name: server.server_name.clone(),
                            tools,
                            error: None,
                        },
                    );
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(server_id = %server.server_id, "[ConnectionManager] tools/list failed: {}", error);
                    result.errors.push(format!("{}: {}", server.server_name, error));
                    result.tools_by_server.insert(
                        server.server_id.clone(),
                        ServerTools {
                            server_name: server.server_name.clone(),
                            tools: Vec::new(),
                            error: Some(error),
                        },
                    );
                }
            }
        }

        result
    }
}
