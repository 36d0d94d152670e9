//! mcplink - inspect and probe MCP servers from the command line
//!
//! Server records are read from JSON files holding either one config object
//! or an array of them. Results are printed to stdout as pretty JSON; logs
//! go to stderr (and optionally a daily rolling file).

mod config_file;
mod logging;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mcplink_pool::{
    check_server_health_with, detect_authentication_type_with_timeout,
    detect_transport_type_with_timeout, validate_server_config, ConnectionManager,
    DefaultTransportFactory, ManagerSettings,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::config_file::load_servers;

#[derive(Parser)]
#[command(name = "mcplink")]
#[command(author, version, about = "Connect to, probe and inspect MCP servers", long_about = None)]
struct Cli {
    /// Also write logs to a daily rolling file in this directory
    #[arg(long, env = "MCPLINK_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server records for consistency without connecting
    Validate { config: PathBuf },
    /// Connect to each server once and report what it exposes
    Health { config: PathBuf },
    /// Work out what authentication an endpoint expects
    DetectAuth { url: String },
    /// Work out which HTTP transports an endpoint speaks
    DetectTransport { url: String },
    /// List tool, resource, prompt and template names per server
    Capabilities { config: PathBuf },
    /// Collect every server's tools into one prefixed namespace
    Tools {
        #[arg(required = true)]
        configs: Vec<PathBuf>,
    },
    /// Invoke a tool on one server
    Call {
        config: PathBuf,
        /// Server id within the config file
        server: String,
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}

/// Load `.env` (the default lookup, or `env_file`) before parsing so clap's
/// `env` fallbacks see variables defined only there
fn parse_cli<I, T>(env_file: Option<&Path>, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match env_file {
        Some(path) => dotenvy::from_path(path).ok(),
        None => dotenvy::dotenv().ok().map(|_| ()),
    };
    Cli::try_parse_from(args)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = parse_cli(None, std::env::args_os()).unwrap_or_else(|e| e.exit());
    let _guard = logging::init_tracing(cli.log_dir.as_deref());
    let settings = ManagerSettings::from_env();

    match cli.command {
        Commands::Validate { config } => {
            let servers = load_servers(&config)?;
            let mut all_valid = true;
            let mut report = Map::new();
            for server in &servers {
                let result = validate_server_config(server);
                all_valid &= result.valid;
                report.insert(server.id.clone(), serde_json::to_value(result)?);
            }
            print_json(&report)?;
            Ok(if all_valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::Health { config } => {
            let servers = load_servers(&config)?;
            let mut report = Map::new();
            for server in &servers {
                let result =
                    check_server_health_with(&DefaultTransportFactory, server, settings.probe_timeout).await;
                report.insert(server.id.clone(), serde_json::to_value(result)?);
            }
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::DetectAuth { url } => {
            print_json(&detect_authentication_type_with_timeout(&url, settings.probe_timeout).await)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::DetectTransport { url } => {
            print_json(&detect_transport_type_with_timeout(&url, settings.probe_timeout).await)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Capabilities { config } => {
            let servers = load_servers(&config)?;
            let manager = ConnectionManager::new(settings);
            let mut report = Map::new();
            for server in &servers {
                let summary = manager.get_server_capabilities(server).await;
                report.insert(server.id.clone(), serde_json::to_value(summary)?);
            }
            manager.destroy().await;
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools { configs } => {
            let mut servers = Vec::new();
            for path in &configs {
                servers.extend(load_servers(path)?);
            }
            let manager = ConnectionManager::new(settings);
            let result = manager.get_all_tools(&servers).await;
            info!(
                tools = result.combined_tools.len(),
                errors = result.errors.len(),
                "Collected tools"
            );
            manager.destroy().await;
            print_json(&result)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call {
            config,
            server,
            tool,
            args,
        } => {
            let servers = load_servers(&config)?;
            let Some(target) = servers.iter().find(|s| s.id == server) else {
                bail!("No server with id '{}' in {}", server, config.display());
            };
            let arguments = match args {
                Some(raw) => match serde_json::from_str::<Value>(&raw).context("--args must be JSON")? {
                    Value::Object(map) => Some(map),
                    other => bail!("--args must be a JSON object, got {}", other),
                },
                None => None,
            };

            let manager = ConnectionManager::new(settings);
            let outcome = manager.call_tool(target, &tool, arguments).await;
            manager.destroy().await;

            match outcome {
                Ok(result) => {
                    print_json(&result)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    print_json(&json!({ "error": e.to_string() }))?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
