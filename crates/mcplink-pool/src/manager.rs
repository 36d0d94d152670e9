//! Connection Manager - pooled MCP client connections keyed by server id
//!
//! Lifecycle per server id: `absent -> connected -> absent`. A connection is
//! only inserted after its handshake and smoke test succeed, so everything
//! in the pool is usable. Idle connections are closed by a background sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use mcplink_core::{
    validate_server_config, ConnectionStatusEntry, HealthCheckResult, ManagerSettings, ServerConfig,
};
use rmcp::model::{CallToolRequestParams, CallToolResult, JsonObject};
use rmcp::service::ServiceError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{McpClient, McpClientHandler};
use crate::error::{PoolError, PoolResult};
use crate::probes;
use crate::proxy::check_proxy_health;
use crate::transport::{DefaultTransportFactory, Transport, TransportFactory};

/// Shared handle to a connected client
pub type SharedClient = Arc<McpClient>;

/// A live connection in the pool
struct PooledConnection {
    client: SharedClient,
    server_name: String,
    last_activity: Instant,
    last_activity_at: DateTime<Utc>,
}

impl PooledConnection {
    fn new(client: SharedClient, server_name: &str) -> Self {
        Self {
            client,
            server_name: server_name.to_string(),
            last_activity: Instant::now(),
            last_activity_at: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
        self.last_activity_at = Utc::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Pool of MCP client connections.
///
/// Construct with [`ConnectionManager::new`] inside a Tokio runtime; the
/// stale-connection sweep starts immediately and stops on [`destroy`] or
/// when the last `Arc` is dropped.
///
/// [`destroy`]: ConnectionManager::destroy
pub struct ConnectionManager {
    connections: DashMap<String, PooledConnection>,
    /// Serializes connects per server id so one id never opens two clients
    connect_locks: DashMap<String, Arc<Mutex<()>>>,
    factory: Arc<dyn TransportFactory>,
    http: reqwest::Client,
    settings: ManagerSettings,
    shutdown: CancellationToken,
    sweeper: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(settings: ManagerSettings) -> Arc<Self> {
        Self::with_factory(settings, Arc::new(DefaultTransportFactory))
    }

    /// Create a manager that builds transports through `factory`
    pub fn with_factory(settings: ManagerSettings, factory: Arc<dyn TransportFactory>) -> Arc<Self> {
        let manager = Arc::new(Self {
            connections: DashMap::new(),
            connect_locks: DashMap::new(),
            factory,
            http: reqwest::Client::new(),
            settings,
            shutdown: CancellationToken::new(),
            sweeper: parking_lot::Mutex::new(None),
        });
        manager.spawn_sweeper();
        manager
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    fn spawn_sweeper(self: &Arc<Self>) {
        let manager = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        let period = self.settings.sweep_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(manager) = manager.upgrade() else { break };
                let evicted = manager.sweep_stale_connections().await;
                if evicted > 0 {
                    debug!(evicted, "[ConnectionManager] Sweep closed stale connections");
                }
            }
            debug!("[ConnectionManager] Stale connection sweep stopped");
        });

        *self.sweeper.lock() = Some(handle);
    }

    fn connect_lock(&self, server_id: &str) -> Arc<Mutex<()>> {
        self.connect_locks
            .entry(server_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the lock once no other connect holds or awaits it
    fn release_connect_lock(&self, server_id: &str) {
        self.connect_locks
            .remove_if(server_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn touch(&self, server_id: &str) -> Option<SharedClient> {
        self.connections.get_mut(server_id).map(|mut conn| {
            conn.touch();
            Arc::clone(&conn.client)
        })
    }

    /// Return the pooled client for `config.id`, connecting if needed.
    ///
    /// Idempotent: an existing connection is returned unchanged with its
    /// activity refreshed. Nothing is pooled unless the smoke test passes.
    pub async fn connect(&self, config: &ServerConfig) -> PoolResult<SharedClient> {
        validate_server_config(config).into_result()?;

        if let Some(client) = self.touch(&config.id) {
            debug!(server_id = %config.id, "[ConnectionManager] Reusing pooled connection");
            return Ok(client);
        }

        let lock = self.connect_lock(&config.id);
        let result = {
            let _guard = lock.lock().await;
            self.connect_locked(config).await
        };
        drop(lock);
        self.release_connect_lock(&config.id);
        result
    }

    async fn connect_locked(&self, config: &ServerConfig) -> PoolResult<SharedClient> {
        // Another task may have finished connecting while we waited
        if let Some(client) = self.touch(&config.id) {
            return Ok(client);
        }

        let client = Arc::new(self.establish(config).await?);
        self.connections.insert(
            config.id.clone(),
            PooledConnection::new(Arc::clone(&client), &config.name),
        );
        info!(
            server_id = %config.id,
            server_name = %config.name,
            pool_size = self.connections.len(),
            "[ConnectionManager] Connection pooled"
        );
        Ok(client)
    }

    async fn establish(&self, config: &ServerConfig) -> PoolResult<McpClient> {
        if config.is_proxied() {
            let proxy_url = config.proxy_url.as_deref().unwrap_or_default();
            let health = check_proxy_health(
                &self.http,
                proxy_url,
                config.proxy_auth_token.as_deref(),
                config.proxy_auth_header_name(),
            )
            .await;
            if !health.is_ok() {
                warn!(
                    server_id = %config.id,
                    proxy_url,
                    "[ConnectionManager] Proxy health check failed: {}",
                    health.message
                );
                return Err(PoolError::ProxyUnavailable {
                    server_name: config.name.clone(),
                    message: health.message,
                });
            }
        }

        let transport = self.factory.create(config)?;
        let deadline = config
            .max_total_timeout()
            .unwrap_or(self.settings.connect_timeout);

        info!(
            server_id = %config.id,
            transport = %transport.description(),
            timeout = ?deadline,
            "[ConnectionManager] Connecting"
        );

        match tokio::time::timeout(deadline, open_and_verify(transport.as_ref(), config)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(server_id = %config.id, "[ConnectionManager] Connect timed out after {:?}", deadline);
                Err(PoolError::Timeout {
                    operation: "connect",
                    after: deadline,
                })
            }
        }
    }

    /// Pooled client for `server_id`, refreshing its activity timestamp
    pub fn get(&self, server_id: &str) -> Option<SharedClient> {
        self.touch(server_id)
    }

    /// Pooled client or a fresh connection; failures are logged and yield `None`
    pub(crate) async fn client_for(&self, config: &ServerConfig) -> Option<SharedClient> {
        if let Some(client) = self.get(&config.id) {
            return Some(client);
        }
        match self.connect(config).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(server_id = %config.id, "[ConnectionManager] Unable to obtain client: {}", e);
                None
            }
        }
    }

    /// Run one MCP request under the server's `requestTimeout`, if any
    pub(crate) async fn timed<T, F>(&self, config: &ServerConfig, operation: &'static str, request: F) -> PoolResult<T>
    where
        F: std::future::Future<Output = Result<T, ServiceError>>,
    {
        match config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| PoolError::Timeout {
                    operation,
                    after: limit,
                })?
                .map_err(PoolError::from),
            None => request.await.map_err(PoolError::from),
        }
    }

    pub fn is_connected(&self, server_id: &str) -> bool {
        self.connections.contains_key(server_id)
    }

    pub fn active_connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connection_status(&self) -> Vec<ConnectionStatusEntry> {
        let mut status: Vec<_> = self
            .connections
            .iter()
            .map(|conn| ConnectionStatusEntry {
                server_id: conn.key().clone(),
                server_name: conn.server_name.clone(),
                connected: true,
                last_activity: conn.last_activity_at,
            })
            .collect();
        status.sort_by(|a, b| a.server_id.cmp(&b.server_id));
        status
    }

    /// Close and forget the connection for `server_id`. Absent ids are a no-op.
    pub async fn disconnect(&self, server_id: &str) {
        let Some((_, conn)) = self.connections.remove(server_id) else {
            debug!(server_id, "[ConnectionManager] Disconnect: not connected");
            return;
        };
        info!(server_id, server_name = %conn.server_name, "[ConnectionManager] Disconnecting");
        close_client(conn.client, server_id).await;
    }

    pub async fn disconnect_all(&self) {
        let ids: Vec<String> = self.connections.iter().map(|c| c.key().clone()).collect();
        join_all(ids.iter().map(|id| self.disconnect(id))).await;
    }

    /// Close every connection idle for longer than `stale_after`.
    /// Returns how many were closed.
    pub async fn sweep_stale_connections(&self) -> usize {
        let stale_after = self.settings.stale_after;
        let candidates: Vec<String> = self
            .connections
            .iter()
            .filter(|conn| conn.idle_for() > stale_after)
            .map(|conn| conn.key().clone())
            .collect();

        let mut evicted = 0;
        for server_id in candidates {
            // Re-check under the shard lock; the connection may have been used since
            let removed = self
                .connections
                .remove_if(&server_id, |_, conn| conn.idle_for() > stale_after);
            if let Some((_, conn)) = removed {
                info!(
                    server_id = %server_id,
                    idle = ?conn.idle_for(),
                    "[ConnectionManager] Closing stale connection"
                );
                close_client(conn.client, &server_id).await;
                evicted += 1;
            }
        }
        evicted
    }

    /// Invoke a tool on a server, connecting if needed
    pub async fn call_tool(
        &self,
        config: &ServerConfig,
        tool_name: &str,
        arguments: Option<JsonObject>,
    ) -> PoolResult<CallToolResult> {
        let client = self.connect(config).await?;
        let params = CallToolRequestParams {
            name: tool_name.to_string().into(),
            arguments,
            task: None,
            meta: None,
        };
        self.timed(config, "tools/call", client.call_tool(params)).await
    }

    /// Probe a server on a throwaway connection (never pooled)
    pub async fn check_health(&self, config: &ServerConfig) -> HealthCheckResult {
        probes::check_server_health_with(self.factory.as_ref(), config, self.settings.probe_timeout).await
    }

    /// Stop the sweep and close every connection
    pub async fn destroy(&self) {
        self.shutdown.cancel();
        let sweeper = self.sweeper.lock().take();
        if let Some(handle) = sweeper {
            let _ = handle.await;
        }
        self.disconnect_all().await;
        info!("[ConnectionManager] Destroyed");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Connect and run the `tools/list` smoke test. The half-open client is
/// closed before an error is returned.
async fn open_and_verify(transport: &dyn Transport, config: &ServerConfig) -> PoolResult<McpClient> {
    let client = transport
        .connect(McpClientHandler::new(&config.id, &config.name))
        .await?;

    if let Err(e) = client.list_tools(Default::default()).await {
        warn!(server_id = %config.id, "[ConnectionManager] Smoke test failed: {}", e);
        if let Err(close_err) = client.cancel().await {
            debug!(server_id = %config.id, "Error closing half-open client: {}", close_err);
        }
        return Err(PoolError::connection(
            &config.name,
            format!("Smoke test (tools/list) failed: {}", e),
        ));
    }

    Ok(client)
}

/// Close a client. Errors are logged, never raised.
async fn close_client(client: SharedClient, server_id: &str) {
    match Arc::try_unwrap(client) {
        Ok(client) => {
            if let Err(e) = client.cancel().await {
                warn!(server_id, "Error closing MCP client: {}", e);
            }
        }
        Err(shared) => {
            // Still borrowed by an in-flight caller; cancelling the token stops the service
            shared.cancellation_token().cancel();
        }
    }
}
