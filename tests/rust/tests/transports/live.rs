use mcplink_pool::{DefaultTransportFactory, McpClientHandler, ServerConfig, TransportFactory, TransportType};
use pretty_assertions::assert_eq;
use rmcp::model::CallToolRequestParams;
use serde_json::json;
use tests::async_helpers::{with_timeout, DEFAULT_TIMEOUT};
use tests::{start_sse_server, start_streamable_http_server, MockMcpServer};

async fn exercise(config: ServerConfig, expected_type: TransportType) {
    let transport = DefaultTransportFactory.create(&config).unwrap();
    assert_eq!(transport.transport_type(), expected_type);

    let client = with_timeout(
        DEFAULT_TIMEOUT,
        transport.connect(McpClientHandler::new(&config.id, &config.name)),
    )
    .await
    .unwrap();

    let info = client.peer_info().unwrap();
    assert_eq!(info.server_info.name, config.name);

    let tools = client.list_all_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, vec!["search", "fetch"]);

    let result = client
        .call_tool(CallToolRequestParams {
            name: "fetch".into(),
            arguments: json!({"id": 7}).as_object().cloned(),
            task: None,
            meta: None,
        })
        .await
        .unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["content"][0]["text"], r#"fetch:{"id":7}"#);

    client.cancel().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_streamable_http_round_trip() {
    let host = start_streamable_http_server(MockMcpServer::new("alpha").with_tools(&["search", "fetch"])).await;
    exercise(ServerConfig::streamable_http("a", "alpha", &host.url), TransportType::StreamableHttp).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_legacy_sse_round_trip() {
    let host = start_sse_server(MockMcpServer::new("legacy").with_tools(&["search", "fetch"])).await;
    exercise(ServerConfig::sse("l", "legacy", &host.url), TransportType::Sse).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sse_sessions_are_independent() {
    let host = start_sse_server(MockMcpServer::new("legacy")).await;
    let config = ServerConfig::sse("l", "legacy", &host.url);
    let factory = DefaultTransportFactory;

    let first = factory.create(&config).unwrap().connect(McpClientHandler::new("l", "legacy")).await.unwrap();
    let second = factory.create(&config).unwrap().connect(McpClientHandler::new("l", "legacy")).await.unwrap();

    first.cancel().await.unwrap();
    // The other session keeps working
    assert_eq!(second.list_all_tools().await.unwrap().len(), 1);
    second.cancel().await.unwrap();
}
