//! Proxy health probe
//!
//! Servers configured with `connectionType: proxy` are only connected once
//! the proxy answers `GET {proxyUrl}/health` with `{"status": "ok"}`.

use mcplink_core::ProxyHealthResult;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn health_url(proxy_url: &str) -> String {
    format!("{}/health", proxy_url.trim().trim_end_matches('/'))
}

/// Probe a proxy's health endpoint. Never fails; problems are reported in the result.
pub async fn check_proxy_health(
    http: &reqwest::Client,
    proxy_url: &str,
    auth_token: Option<&str>,
    auth_header: &str,
) -> ProxyHealthResult {
    let url = health_url(proxy_url);
    let mut request = http.get(&url);
    if let Some(token) = auth_token.map(str::trim).filter(|t| !t.is_empty()) {
        request = request.header(auth_header, format!("Bearer {}", token));
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, "Proxy health check failed: {}", e);
            return ProxyHealthResult::error(format!("Proxy unreachable: {}", e));
        }
    };

    let status = response.status();
    if !status.is_success() {
        return ProxyHealthResult::error(format!("Proxy health endpoint returned HTTP {}", status));
    }

    match response.json::<HealthBody>().await {
        Ok(HealthBody { status: Some(s), .. }) if s == "ok" => {
            debug!(url = %url, "Proxy healthy");
            ProxyHealthResult::ok("Proxy is healthy")
        }
        Ok(body) => ProxyHealthResult::error(body.message.unwrap_or_else(|| {
            format!(
                "Proxy reported status '{}'",
                body.status.as_deref().unwrap_or("missing")
            )
        })),
        Err(e) => ProxyHealthResult::error(format!("Malformed proxy health response: {}", e)),
    }
}
