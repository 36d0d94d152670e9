use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Wire protocol used to reach an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportType {
    /// Local child process speaking over stdin/stdout
    #[serde(alias = "STDIO")]
    Stdio,
    /// Legacy HTTP+SSE transport (GET event stream, POST messages)
    #[serde(alias = "SSE")]
    Sse,
    /// Streamable HTTP transport
    #[serde(alias = "STREAMABLE_HTTP", alias = "streamable_http")]
    StreamableHttp,
}

impl TransportType {
    /// Canonical lowercase name, as used in JSON records
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Stdio => "stdio",
            TransportType::Sse => "sse",
            TransportType::StreamableHttp => "streamable-http",
        }
    }

    /// Human readable label used in validation messages
    pub fn label(&self) -> &'static str {
        match self {
            TransportType::Stdio => "STDIO",
            TransportType::Sse => "SSE",
            TransportType::StreamableHttp => "Streamable HTTP",
        }
    }

    /// Whether this transport is addressed by URL
    pub fn is_url_based(&self) -> bool {
        matches!(self, TransportType::Sse | TransportType::StreamableHttp)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "stdio" => Ok(TransportType::Stdio),
            "sse" => Ok(TransportType::Sse),
            "streamable-http" | "http" => Ok(TransportType::StreamableHttp),
            _ => Err(ConfigError::UnknownTransport(s.to_string())),
        }
    }
}

/// How the connection reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    #[serde(alias = "DIRECT")]
    Direct,
    #[serde(alias = "PROXY")]
    Proxy,
}

/// An operator-supplied HTTP header attached to URL based transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHeader {
    pub name: String,
    pub value: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CustomHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Disabled or blank headers never reach the wire
    pub fn is_effective(&self) -> bool {
        self.enabled && !self.name.trim().is_empty() && !self.value.trim().is_empty()
    }
}

/// Configuration record for one remote MCP server.
///
/// Owned by the caller (usually loaded from persistence) and treated as
/// immutable for the lifetime of a pooled connection. Changing any field
/// requires a disconnect followed by a new connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Stable identity, used as the pool key
    pub id: String,
    /// Display name, also used as the tool-name prefix
    pub name: String,
    /// Optional in the record so validation can report its absence
    #[serde(default)]
    pub transport_type: Option<TransportType>,
    #[serde(default)]
    pub connection_type: ConnectionType,

    // --- stdio ---
    #[serde(default)]
    pub command: Option<String>,
    /// Whitespace separated argument string
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,

    // --- sse / streamable-http ---
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub custom_headers: Vec<CustomHeader>,

    // --- proxy ---
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub proxy_auth_token: Option<String>,
    #[serde(default)]
    pub proxy_auth_header: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Upper bound for connect + smoke test in milliseconds
    #[serde(default)]
    pub max_total_timeout: Option<u64>,

    /// Streamable HTTP session to resume
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ServerConfig {
    fn base(id: impl Into<String>, name: impl Into<String>, transport: TransportType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transport_type: Some(transport),
            connection_type: ConnectionType::Direct,
            command: None,
            args: None,
            env: HashMap::new(),
            url: None,
            custom_headers: Vec::new(),
            proxy_url: None,
            proxy_auth_token: None,
            proxy_auth_header: None,
            request_timeout: None,
            max_total_timeout: None,
            session_id: None,
        }
    }

    /// A stdio server. Note that stdio servers must be reached through a proxy
    /// to pass validation; see [`ServerConfig::with_proxy`].
    pub fn stdio(id: impl Into<String>, name: impl Into<String>, command: impl Into<String>) -> Self {
        let mut config = Self::base(id, name, TransportType::Stdio);
        config.command = Some(command.into());
        config
    }

    pub fn sse(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut config = Self::base(id, name, TransportType::Sse);
        config.url = Some(url.into());
        config
    }

    pub fn streamable_http(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let mut config = Self::base(id, name, TransportType::StreamableHttp);
        config.url = Some(url.into());
        config
    }

    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = Some(args.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push(CustomHeader::new(name, value));
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>, auth_token: Option<String>) -> Self {
        self.connection_type = ConnectionType::Proxy;
        self.proxy_url = Some(proxy_url.into());
        self.proxy_auth_token = auth_token;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_max_total_timeout(mut self, timeout: Duration) -> Self {
        self.max_total_timeout = Some(timeout.as_millis() as u64);
        self
    }

    /// Argument tokens: whitespace split, empty tokens dropped
    pub fn arg_list(&self) -> Vec<String> {
        self.args
            .as_deref()
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Flatten enabled, non-blank custom headers. Later duplicates win.
    pub fn effective_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        for header in self.custom_headers.iter().filter(|h| h.is_effective()) {
            headers.insert(header.name.trim().to_string(), header.value.trim().to_string());
        }
        headers
    }

    /// Header used to authenticate against the proxy (defaults to `Authorization`)
    pub fn proxy_auth_header_name(&self) -> &str {
        self.proxy_auth_header
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or("Authorization")
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn max_total_timeout(&self) -> Option<Duration> {
        self.max_total_timeout.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn is_proxied(&self) -> bool {
        self.connection_type == ConnectionType::Proxy
    }
}
