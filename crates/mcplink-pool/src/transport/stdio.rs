//! STDIO transport for MCP servers
//!
//! Spawns the server as a child process and speaks JSON-RPC over its
//! stdin/stdout.

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use mcplink_core::{ConfigError, TransportType};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::ServiceExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::Transport;
use crate::client::{McpClient, McpClientHandler};
use crate::error::{PoolError, PoolResult};

/// Split a command line into executable and arguments.
///
/// When explicit args are given the command is used as-is. Otherwise a
/// command with embedded spaces is split with shell quoting rules.
pub fn parse_command(command: &str, args: &[String]) -> Result<(String, Vec<String>), ConfigError> {
    if !args.is_empty() {
        return Ok((command.to_string(), args.to_vec()));
    }

    if !command.contains(' ') {
        return Ok((command.to_string(), Vec::new()));
    }

    let mut parts = shell_words::split(command)
        .map_err(|e| ConfigError::InvalidCommand(format!("{} (check for unmatched quotes)", e)))?
        .into_iter();
    let executable = parts
        .next()
        .ok_or_else(|| ConfigError::InvalidCommand("empty command after parsing".to_string()))?;
    Ok((executable, parts.collect()))
}

/// STDIO transport for child process MCP servers
pub struct StdioTransport {
    server_id: String,
    server_name: String,
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl StdioTransport {
    pub fn new(
        server_id: &str,
        server_name: &str,
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            server_id: server_id.to_string(),
            server_name: server_name.to_string(),
            command,
            args,
            env,
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn connect(&self, handler: McpClientHandler) -> PoolResult<McpClient> {
        info!(
            server_id = %self.server_id,
            command = %self.command,
            "Connecting to STDIO server"
        );

        let command_path = which::which(&self.command)
            .or_else(|_| which::which(format!("{}.exe", &self.command)))
            .map_err(|_| {
                let err = format!(
                    "Command not found: {}. Ensure it's installed and in PATH.",
                    self.command
                );
                error!(server_id = %self.server_id, "{}", err);
                PoolError::connection(&self.server_name, err)
            })?;

        debug!(server_id = %self.server_id, path = ?command_path, "Found command");

        let args = self.args.clone();
        let env = self.env.clone();
        let transport = TokioChildProcess::new(Command::new(&command_path).configure(move |cmd| {
            cmd.args(&args)
                .envs(&env)
                .stderr(Stdio::null())
                .kill_on_drop(true);
        }))
        .map_err(|e| {
            error!(server_id = %self.server_id, "Failed to spawn process: {}", e);
            PoolError::connection(&self.server_name, format!("Failed to spawn process: {}", e))
        })?;

        let client = handler.serve(transport).await.map_err(|e| {
            PoolError::connection(&self.server_name, format!("MCP handshake failed: {}", e))
        })?;

        info!(server_id = %self.server_id, "STDIO server connected");
        Ok(client)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Stdio
    }

    fn description(&self) -> String {
        if self.args.is_empty() {
            format!("stdio:{}", self.command)
        } else {
            format!("stdio:{} {}", self.command, self.args.join(" "))
        }
    }
}
