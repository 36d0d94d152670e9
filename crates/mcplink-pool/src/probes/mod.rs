//! Diagnostic probes
//!
//! Every probe opens its own short-lived connection, never touches the
//! pool, and reports failures inside its result value.

mod auth;
mod detect;
mod health;

use std::time::Duration;

use tracing::debug;

pub use auth::{classify_challenge, detect_authentication_type, detect_authentication_type_with_timeout};
pub use detect::{detect_transport_type, detect_transport_type_with_timeout};
pub use health::{check_server_health, check_server_health_with};

use crate::client::McpClientHandler;
use crate::transport::Transport;

/// What a handshake probe does after initialize succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Liveness {
    HandshakeOnly,
    ListResources,
}

/// Connect through `transport` within `timeout`, optionally list resources,
/// then close the client.
pub(crate) async fn handshake_probe(
    transport: &dyn Transport,
    liveness: Liveness,
    timeout: Duration,
) -> Result<(), String> {
    let attempt = async {
        let client = transport
            .connect(McpClientHandler::new("probe", &transport.description()))
            .await
            .map_err(|e| e.to_string())?;

        let listed = match liveness {
            Liveness::HandshakeOnly => Ok(()),
            Liveness::ListResources => client
                .list_resources(Default::default())
                .await
                .map(|_| ())
                .map_err(|e| format!("Liveness probe (resources/list) failed: {}", e)),
        };

        if let Err(e) = client.cancel().await {
            debug!(transport = %transport.description(), "Error closing probe client: {}", e);
        }
        listed
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(format!("Timed out after {:?}", timeout)),
    }
}
