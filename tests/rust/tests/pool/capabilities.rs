use mcplink_pool::{ConnectionManager, ServerConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use tests::async_helpers::settle;
use tests::fixtures::{http_server, quiet_settings, unreachable_server};
use tests::{start_sse_server, start_streamable_http_server, MockMcpServer};

#[tokio::test(flavor = "multi_thread")]
async fn test_server_capabilities_summary() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha").with_tools(&["search", "fetch"])).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = http_server("a", "alpha", &host.url);

    let summary = manager.get_server_capabilities(&config).await;

    assert_eq!(summary.tools, vec!["search", "fetch"]);
    assert_eq!(summary.resources, vec!["readme"]);
    assert_eq!(summary.prompts, vec!["greet"]);
    assert_eq!(summary.resource_templates, vec!["files"]);
    // Four concurrent facets still share one pooled connection
    assert_eq!(manager.active_connection_count(), 1);
    settle().await;
    assert_eq!(host.server.session_count(), 1);
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_resource_and_get_prompt() {
    let host = start_sse_server(MockMcpServer::new("legacy")).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = ServerConfig::sse("legacy", "legacy", &host.url);

    let resource = manager.read_resource(&config, "mem://readme").await.unwrap();
    let contents = serde_json::to_value(&resource).unwrap();
    assert_eq!(contents["contents"][0]["text"], "hello from readme");

    let args = json!({"who": "Ada"}).as_object().cloned();
    let prompt = manager.get_prompt(&config, "greet", args).await.unwrap();
    let messages = serde_json::to_value(&prompt.messages).unwrap();
    assert_eq!(messages[0]["content"]["text"], "Hello, Ada!");
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failures_fold_to_empty_values() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha")).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = http_server("a", "alpha", &host.url);

    // Server-side errors
    assert!(manager.read_resource(&config, "mem://missing").await.is_none());
    assert!(manager.get_prompt(&config, "missing", None).await.is_none());

    // Unreachable server
    let down = unreachable_server("down", "down");
    assert!(manager.list_tools(&down).await.is_empty());
    assert!(manager.list_prompts(&down).await.is_empty());
    assert!(manager.list_resources(&down).await.is_empty());
    assert!(manager.list_resource_templates(&down).await.is_empty());
    assert!(manager.get_server_capabilities(&down).await.tools.is_empty());
    manager.destroy().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_tool_propagates_errors() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha")).await;
    let manager = ConnectionManager::new(quiet_settings());
    let config = http_server("a", "alpha", &host.url);

    let result = manager
        .call_tool(&config, "search", json!({"q": "rust"}).as_object().cloned())
        .await
        .unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["content"][0]["text"], r#"search:{"q":"rust"}"#);

    assert!(manager.call_tool(&config, "nope", None).await.is_err());
    assert!(manager.call_tool(&unreachable_server("down", "down"), "search", None).await.is_err());
    manager.destroy().await;
}
