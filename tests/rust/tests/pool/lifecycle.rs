use std::sync::Arc;
use std::time::Duration;

use mcplink_pool::{ConnectionManager, PoolError, ServerConfig};
use pretty_assertions::assert_eq;
use tests::async_helpers::{settle, with_timeout, DEFAULT_TIMEOUT};
use tests::fixtures::{http_server, quiet_settings, unreachable_server};
use tests::{init_test_tracing, start_sse_server, start_streamable_http_server, MockMcpServer};

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_twice_returns_same_client() {
    init_test_tracing();
    let host = start_streamable_http_server(MockMcpServer::new("alpha")).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = http_server("a", "alpha", &host.url);

    let first = with_timeout(DEFAULT_TIMEOUT, manager.connect(&config)).await.unwrap();
    let second = with_timeout(DEFAULT_TIMEOUT, manager.connect(&config)).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.active_connection_count(), 1);
    settle().await;
    assert_eq!(host.server.session_count(), 1);
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_over_legacy_sse() {
    let host = start_sse_server(MockMcpServer::new("legacy")).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = ServerConfig::sse("legacy", "legacy", &host.url);

    with_timeout(DEFAULT_TIMEOUT, manager.connect(&config)).await.unwrap();
    assert!(manager.is_connected("legacy"));

    let tools = manager.list_tools(&config).await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "search");
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_is_idempotent() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha")).await;
    let manager = ConnectionManager::new(quiet_settings());
    manager.connect(&http_server("a", "alpha", &host.url)).await.unwrap();

    manager.disconnect("a").await;
    manager.disconnect("a").await;

    assert!(!manager.is_connected("a"));
    assert!(manager.get("a").is_none());
    assert_eq!(manager.active_connection_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reconnect_after_disconnect_opens_new_session() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha")).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = http_server("a", "alpha", &host.url);

    let first = manager.connect(&config).await.unwrap();
    manager.disconnect("a").await;
    let second = manager.connect(&config).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    settle().await;
    assert_eq!(host.server.session_count(), 2);
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stale_connection_evicted_recent_one_survives() {
    let stale = start_streamable_http_server(MockMcpServer::new("stale")).await;
    let fresh = start_streamable_http_server(MockMcpServer::new("fresh")).await;
    let manager = ConnectionManager::new(quiet_settings().with_stale_after(Duration::from_millis(300)));

    manager.connect(&http_server("stale", "stale", &stale.url)).await.unwrap();
    manager.connect(&http_server("fresh", "fresh", &fresh.url)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(450)).await;
    assert!(manager.get("fresh").is_some());

    assert_eq!(manager.sweep_stale_connections().await, 1);
    assert!(!manager.is_connected("stale"));
    assert!(manager.is_connected("fresh"));
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_server_is_not_pooled() {
    let manager = ConnectionManager::new(quiet_settings());
    let err = with_timeout(DEFAULT_TIMEOUT, manager.connect(&unreachable_server("down", "down")))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, PoolError::Connection { .. } | PoolError::Timeout { .. }));
    assert!(!manager.is_connected("down"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_status_snapshot() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha")).await;
    let manager = ConnectionManager::new(quiet_settings());
    manager.connect(&http_server("a", "alpha", &host.url)).await.unwrap();

    let status = manager.connection_status();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].server_id, "a");
    assert_eq!(status[0].server_name, "alpha");
    assert!(status[0].connected);

    let json = serde_json::to_value(&status[0]).unwrap();
    assert!(json.get("lastActivity").is_some());
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_destroy_disconnects_everything() {
    let a = start_streamable_http_server(MockMcpServer::new("a")).await;
    let b = start_sse_server(MockMcpServer::new("b")).await;
    let manager = ConnectionManager::new(quiet_settings());
    manager.connect(&http_server("a", "a", &a.url)).await.unwrap();
    manager.connect(&ServerConfig::sse("b", "b", &b.url)).await.unwrap();

    manager.destroy().await;
    assert_eq!(manager.active_connection_count(), 0);
}
