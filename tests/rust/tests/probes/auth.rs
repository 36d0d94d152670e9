use mcplink_pool::{detect_authentication_type, AuthType};
use pretty_assertions::assert_eq;
use tests::{start_sse_server, MockMcpServer};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn test_open_sse_endpoint() {
    let host = start_sse_server(MockMcpServer::new("legacy")).await;

    let result = detect_authentication_type(&host.url).await;

    assert!(result.is_authenticated);
    assert!(!result.requires_auth);
    assert_eq!(result.auth_type, Some(AuthType::None));
}

#[tokio::test]
async fn test_bearer_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Bearer realm="mcp""#),
        )
        .mount(&server)
        .await;

    let result = detect_authentication_type(&format!("{}/mcp", server.uri())).await;

    assert!(result.requires_auth);
    assert!(!result.is_authenticated);
    assert_eq!(result.auth_type, Some(AuthType::Bearer));
    assert_eq!(result.error.as_deref(), Some("Bearer token required"));
}

#[tokio::test]
async fn test_unauthorized_without_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = detect_authentication_type(&format!("{}/mcp", server.uri())).await;

    assert!(result.requires_auth);
    assert_eq!(result.auth_type, None);
    assert_eq!(result.error.as_deref(), Some("Authentication required (unknown type)"));
}
