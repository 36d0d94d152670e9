use std::collections::HashMap;
use std::time::Duration;

use mcplink_core::settings::DEFAULT_PROBE_TIMEOUT;
use mcplink_core::{AuthCheckResult, AuthType};
use reqwest::header::{ACCEPT, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use super::{handshake_probe, Liveness};
use crate::transport::SseTransport;

pub async fn detect_authentication_type(url: &str) -> AuthCheckResult {
    detect_authentication_type_with_timeout(url, DEFAULT_PROBE_TIMEOUT).await
}

/// Work out what credentials an MCP endpoint wants.
///
/// A plain GET answers most cases. Statuses that say nothing about auth
/// fall back to a real SSE handshake.
pub async fn detect_authentication_type_with_timeout(url: &str, timeout: Duration) -> AuthCheckResult {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(e) => return AuthCheckResult::failed(format!("Invalid URL '{}': {}", url, e)),
    };

    let http = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(http) => http,
        Err(e) => return AuthCheckResult::failed(e.to_string()),
    };

    let response = match http
        .get(parsed.clone())
        .header(ACCEPT, "text/event-stream, application/json")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return AuthCheckResult::failed(e.to_string()),
    };

    let status = response.status();
    debug!(url = %parsed, status = %status, "Auth detection probe");

    if status.is_success() {
        return AuthCheckResult::open();
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok());
        return classify_challenge(challenge);
    }

    drop(response);
    let transport = SseTransport::new("auth-probe", url, parsed, HashMap::new());
    match handshake_probe(&transport, Liveness::HandshakeOnly, timeout).await {
        Ok(()) => AuthCheckResult::open(),
        Err(e) => AuthCheckResult::failed(format!("Connection failed: {}", e)),
    }
}

/// Map a `WWW-Authenticate` challenge onto an [`AuthType`]
pub fn classify_challenge(challenge: Option<&str>) -> AuthCheckResult {
    let Some(raw) = challenge else {
        return AuthCheckResult::requires(None, "Authentication required (unknown type)");
    };

    let lower = raw.to_ascii_lowercase();
    if lower.contains("bearer") {
        AuthCheckResult::requires(Some(AuthType::Bearer), "Bearer token required")
    } else if lower.contains("oauth") {
        AuthCheckResult::requires(Some(AuthType::OAuth), "OAuth authorization required")
    } else {
        AuthCheckResult::requires(
            Some(AuthType::Custom),
            format!("Custom authentication required: {}", raw),
        )
    }
}
