//! Legacy HTTP+SSE transport for MCP servers
//!
//! The client holds a long-lived `GET` event stream. The server's first
//! `endpoint` event names the URL that client messages are `POST`ed to;
//! every later `message` event carries one server JSON-RPC message.
//!
//! ```text
//!   GET  /sse ──────► event: endpoint  data: /messages?session=..
//!                     event: message   data: {"jsonrpc":"2.0",...}
//!   POST /messages?session=.. ◄── client JSON-RPC messages
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream::BoxStream;
use futures::StreamExt;
use mcplink_core::TransportType;
use reqwest::header::ACCEPT;
use rmcp::model::{ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::ServiceExt;
use sse_stream::{Error as SseError, Sse, SseStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::{build_header_map, build_http_client, Transport};
use crate::client::{McpClient, McpClientHandler};
use crate::error::{PoolError, PoolResult};

type EventStream = BoxStream<'static, Result<Sse, SseError>>;

/// Sink/stream pair accepted by rmcp as a client transport
pub type SseChannel = (
    UnboundedSender<ClientJsonRpcMessage>,
    UnboundedReceiver<ServerJsonRpcMessage>,
);

/// Legacy SSE transport
pub struct SseTransport {
    server_id: String,
    server_name: String,
    url: Url,
    headers: HashMap<String, String>,
}

impl SseTransport {
    pub fn new(server_id: &str, server_name: &str, url: Url, headers: HashMap<String, String>) -> Self {
        Self {
            server_id: server_id.to_string(),
            server_name: server_name.to_string(),
            url,
            headers,
        }
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn connect(&self, handler: McpClientHandler) -> PoolResult<McpClient> {
        debug!(
            server_id = %self.server_id,
            header_count = self.headers.len(),
            "Connecting to SSE server"
        );

        let http = build_http_client(build_header_map(&self.headers)?)?;
        let channel = open_sse_channel(http, self.url.clone(), &self.server_id)
            .await
            .map_err(|e| match e {
                PoolError::Http(e) => PoolError::connection(&self.server_name, e.to_string()),
                PoolError::Connection { message, .. } => {
                    PoolError::connection(&self.server_name, message)
                }
                other => other,
            })?;

        let client = handler.serve(channel).await.map_err(|e| {
            PoolError::connection(&self.server_name, format!("MCP handshake failed: {}", e))
        })?;

        info!(server_id = %self.server_id, url = %self.url, "SSE server connected");
        Ok(client)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Sse
    }

    fn description(&self) -> String {
        format!("sse:{}", self.url)
    }
}

/// Open the event stream, wait for the `endpoint` event and start the
/// background reader and writer tasks.
///
/// Either task stopping closes the channel, which in turn ends the rmcp
/// service and fails any request still waiting for a response.
pub async fn open_sse_channel(http: reqwest::Client, sse_url: Url, server_id: &str) -> PoolResult<SseChannel> {
    let response = http
        .get(sse_url.clone())
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    let mut events: EventStream = SseStream::from_byte_stream(response.bytes_stream()).boxed();
    let endpoint = wait_for_endpoint(&mut events, &sse_url).await.map_err(|message| PoolError::Connection {
        server_name: server_id.to_string(),
        message,
    })?;
    debug!(server_id, endpoint = %endpoint, "SSE message endpoint received");

    let (outbound_tx, outbound_rx) = mpsc::unbounded::<ClientJsonRpcMessage>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded::<ServerJsonRpcMessage>();
    let shutdown = CancellationToken::new();

    tokio::spawn(read_events(events, inbound_tx, shutdown.clone(), server_id.to_string()));
    tokio::spawn(post_messages(http, endpoint, outbound_rx, shutdown, server_id.to_string()));

    Ok((outbound_tx, inbound_rx))
}

async fn wait_for_endpoint(events: &mut EventStream, sse_url: &Url) -> Result<Url, String> {
    loop {
        match events.next().await {
            Some(Ok(event)) if event.event.as_deref() == Some("endpoint") => {
                let data = event.data.unwrap_or_default();
                return sse_url
                    .join(data.trim())
                    .map_err(|e| format!("Invalid endpoint event '{}': {}", data, e));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(format!("SSE stream error before endpoint event: {}", e)),
            None => return Err("SSE stream closed before endpoint event".to_string()),
        }
    }
}

async fn read_events(
    mut events: EventStream,
    inbound: UnboundedSender<ServerJsonRpcMessage>,
    shutdown: CancellationToken,
    server_id: String,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                if !matches!(event.event.as_deref(), None | Some("message")) {
                    continue;
                }
                let Some(data) = event.data else { continue };
                match serde_json::from_str::<ServerJsonRpcMessage>(&data) {
                    Ok(message) => {
                        if inbound.unbounded_send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(server_id = %server_id, "Dropping malformed SSE message: {}", e),
                }
            }
            Some(Err(e)) => {
                warn!(server_id = %server_id, "SSE stream error: {}", e);
                break;
            }
            None => {
                debug!(server_id = %server_id, "SSE stream closed by server");
                break;
            }
        }
    }
    shutdown.cancel();
}

async fn post_messages(
    http: reqwest::Client,
    endpoint: Url,
    mut outbound: UnboundedReceiver<ClientJsonRpcMessage>,
    shutdown: CancellationToken,
    server_id: String,
) {
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = outbound.next() => match message {
                Some(message) => message,
                None => break,
            },
        };

        match http.post(endpoint.clone()).json(&message).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(
                    server_id = %server_id,
                    status = %response.status(),
                    "SSE message endpoint rejected message"
                );
                break;
            }
            Err(e) => {
                warn!(server_id = %server_id, "Failed to post SSE message: {}", e);
                break;
            }
        }
    }
    shutdown.cancel();
}
