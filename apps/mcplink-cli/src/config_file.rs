use std::path::Path;

use anyhow::{Context, Result};
use mcplink_pool::ServerConfig;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Many(Vec<ServerConfig>),
    One(Box<ServerConfig>),
}

pub fn parse_servers(raw: &str) -> Result<Vec<ServerConfig>> {
    let file: ConfigFile = serde_json::from_str(raw).context("Invalid server config JSON")?;
    Ok(match file {
        ConfigFile::Many(servers) => servers,
        ConfigFile::One(server) => vec![*server],
    })
}

/// Read one server config object or an array of them
pub fn load_servers(path: &Path) -> Result<Vec<ServerConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_servers(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
