//! McpLink Pool
//!
//! Pooled MCP client connections for a host application that talks to many
//! remote MCP servers:
//!
//! - **ConnectionManager**: one live client per server id, idempotent
//!   connect, smoke-tested handshakes, idle-connection sweep
//! - **Capabilities**: failure-tolerant listing and multi-server tool aggregation
//! - **Transports**: stdio child processes, legacy SSE and Streamable HTTP
//! - **Probes**: health check, auth-type and transport-type detection
//! - **Proxy**: health gate for servers reached through a proxy
//!
//! ```text
//!   ServerConfig ──► ConnectionManager ──► TransportFactory ──► Transport
//!                       │   ▲                                    │
//!                       │   └──────── McpClient (rmcp) ◄─────────┘
//!                       ▼
//!                 DashMap<id, PooledConnection> ◄── sweep task
//! ```

mod capabilities;
mod client;
mod error;
mod manager;
pub mod probes;
mod proxy;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use mcplink_core::*;

pub use capabilities::{
    prefixed_tool_name, AllToolsResult, ConnectMultipleResult, ConnectedServer, FailedConnection,
    ServerCapabilitiesSummary, ServerTools,
};
pub use client::{client_capabilities, McpClient, McpClientHandler};
pub use error::{PoolError, PoolResult};
pub use manager::{ConnectionManager, SharedClient};
pub use probes::{
    check_server_health, check_server_health_with, detect_authentication_type,
    detect_authentication_type_with_timeout, detect_transport_type,
    detect_transport_type_with_timeout,
};
pub use proxy::check_proxy_health;
pub use transport::{DefaultTransportFactory, Transport, TransportFactory};
