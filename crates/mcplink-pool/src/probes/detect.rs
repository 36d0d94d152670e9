use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use mcplink_core::settings::DEFAULT_PROBE_TIMEOUT;
use mcplink_core::{TransportDetectionResult, TransportType};
use tracing::debug;
use url::Url;

use super::{handshake_probe, Liveness};
use crate::transport::{SseTransport, StreamableHttpTransport};

const STDIO_UNSUPPORTED: &str = "STDIO transport cannot be detected from a URL";

pub async fn detect_transport_type(url: &str) -> TransportDetectionResult {
    detect_transport_type_with_timeout(url, DEFAULT_PROBE_TIMEOUT).await
}

/// Try SSE and Streamable HTTP against `url` concurrently.
///
/// SSE is recommended when it works, then Streamable HTTP. When neither
/// works Streamable HTTP is still recommended.
pub async fn detect_transport_type_with_timeout(url: &str, timeout: Duration) -> TransportDetectionResult {
    let mut errors = BTreeMap::new();
    errors.insert(TransportType::Stdio, STDIO_UNSUPPORTED.to_string());

    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let message = format!("Invalid URL '{}': {}", url, e);
            errors.insert(TransportType::Sse, message.clone());
            errors.insert(TransportType::StreamableHttp, message);
            return TransportDetectionResult {
                supported_types: Vec::new(),
                recommended: TransportType::StreamableHttp,
                errors,
            };
        }
    };

    let sse = SseTransport::new("detect-sse", url, parsed.clone(), HashMap::new());
    let http = StreamableHttpTransport::new("detect-http", url, parsed, HashMap::new(), None);

    let (sse_result, http_result) = tokio::join!(
        handshake_probe(&sse, Liveness::ListResources, timeout),
        handshake_probe(&http, Liveness::ListResources, timeout),
    );

    let mut supported_types = Vec::new();
    for (transport, result) in [
        (TransportType::Sse, sse_result),
        (TransportType::StreamableHttp, http_result),
    ] {
        match result {
            Ok(()) => supported_types.push(transport),
            Err(e) => {
                debug!(url, transport = %transport, "Transport probe failed: {}", e);
                errors.insert(transport, e);
            }
        }
    }

    let recommended = supported_types
        .first()
        .copied()
        .unwrap_or(TransportType::StreamableHttp);

    TransportDetectionResult {
        supported_types,
        recommended,
        errors,
    }
}
