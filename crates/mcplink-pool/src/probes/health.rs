use std::future::Future;
use std::time::Duration;

use mcplink_core::settings::DEFAULT_PROBE_TIMEOUT;
use mcplink_core::{validate_server_config, CapabilitiesSummary, HealthCheckResult, HealthStatus, ServerConfig};
use rmcp::service::ServiceError;
use tracing::{debug, info, warn};

use crate::client::McpClientHandler;
use crate::transport::{DefaultTransportFactory, TransportFactory};

/// Health check using the real transports and the default probe timeout
pub async fn check_server_health(config: &ServerConfig) -> HealthCheckResult {
    check_server_health_with(&DefaultTransportFactory, config, DEFAULT_PROBE_TIMEOUT).await
}

/// Connect a dedicated client, count what the server exposes, then close it.
///
/// `timeout` bounds the handshake and each listing separately.
pub async fn check_server_health_with(
    factory: &dyn TransportFactory,
    config: &ServerConfig,
    timeout: Duration,
) -> HealthCheckResult {
    if let Err(e) = validate_server_config(config).into_result() {
        return HealthCheckResult::error(e.to_string());
    }

    let transport = match factory.create(config) {
        Ok(transport) => transport,
        Err(e) => return HealthCheckResult::error(e.to_string()),
    };

    debug!(server_id = %config.id, transport = %transport.description(), "Health check");

    let handler = McpClientHandler::new(&config.id, &config.name);
    let client = match tokio::time::timeout(timeout, transport.connect(handler)).await {
        Ok(Ok(client)) => client,
        Ok(Err(e)) => {
            warn!(server_id = %config.id, "Health check failed: {}", e);
            return HealthCheckResult::error(e.to_string());
        }
        Err(_) => {
            return HealthCheckResult::error(format!(
                "Connection to {} timed out after {:?}",
                config.name, timeout
            ))
        }
    };

    let server_info = client
        .peer_info()
        .and_then(|info| serde_json::to_value(info).ok());

    let (tools, resources, prompts) = tokio::join!(
        facet_count(&config.id, "tools", timeout, client.list_all_tools()),
        facet_count(&config.id, "resources", timeout, client.list_all_resources()),
        facet_count(&config.id, "prompts", timeout, client.list_all_prompts()),
    );

    if let Err(e) = client.cancel().await {
        debug!(server_id = %config.id, "Error closing health check client: {}", e);
    }

    info!(server_id = %config.id, tools, resources, prompts, "Health check passed");

    HealthCheckResult {
        status: HealthStatus::Ok,
        message: format!("Successfully connected to {}", config.name),
        server_info,
        capabilities: Some(CapabilitiesSummary::from_counts(tools, resources, prompts)),
    }
}

async fn facet_count<T>(
    server_id: &str,
    facet: &str,
    timeout: Duration,
    listing: impl Future<Output = Result<Vec<T>, ServiceError>>,
) -> usize {
    match tokio::time::timeout(timeout, listing).await {
        Ok(Ok(items)) => items.len(),
        Ok(Err(e)) => {
            debug!(server_id, facet, "Listing failed during health check: {}", e);
            0
        }
        Err(_) => {
            debug!(server_id, facet, "Listing timed out during health check");
            0
        }
    }
}
