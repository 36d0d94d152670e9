use mcplink_core::{validate_server_config, ConnectionType, ServerConfig, TransportType, ValidationResult};
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: serde_json::Value) -> ServerConfig {
    serde_json::from_value(value).expect("server record should deserialize")
}

#[test]
fn test_direct_sse_record_is_valid() {
    let config = record(json!({
        "id": "s1",
        "name": "docs",
        "transportType": "sse",
        "url": "https://ex.com/mcp",
        "connectionType": "direct"
    }));

    assert_eq!(
        validate_server_config(&config),
        ValidationResult {
            valid: true,
            errors: vec![]
        }
    );
}

#[test]
fn test_direct_stdio_without_command_reports_both_errors() {
    let config = record(json!({
        "id": "s1",
        "name": "docs",
        "transportType": "stdio",
        "url": "https://ex.com/mcp",
        "connectionType": "direct"
    }));

    assert_eq!(
        validate_server_config(&config),
        ValidationResult {
            valid: false,
            errors: vec![
                "Command is required for STDIO transport".to_string(),
                "STDIO transport requires proxy connection".to_string(),
            ]
        }
    );
}

#[test]
fn test_connection_type_defaults_to_direct() {
    let config = record(json!({
        "id": "s2",
        "name": "api",
        "transportType": "streamable-http",
        "url": "https://ex.com/mcp"
    }));
    assert_eq!(config.connection_type, ConnectionType::Direct);
    assert_eq!(config.transport_type, Some(TransportType::StreamableHttp));
    assert!(validate_server_config(&config).valid);
}

#[test]
fn test_disabled_and_blank_headers_are_ignored() {
    let config = record(json!({
        "id": "s3",
        "name": "api",
        "transportType": "sse",
        "url": "https://ex.com/sse",
        "customHeaders": [
            {"name": "X-Api-Key", "value": "k1"},
            {"name": "X-Debug", "value": "", "enabled": false},
            {"name": "X-Api-Key", "value": "k2"}
        ]
    }));

    assert!(validate_server_config(&config).valid);
    let headers = config.effective_headers();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers["X-Api-Key"], "k2");
}

#[test]
fn test_unknown_transport_is_rejected_at_parse() {
    let result = serde_json::from_value::<ServerConfig>(json!({
        "id": "s4",
        "name": "ws",
        "transportType": "websocket",
        "url": "wss://ex.com"
    }));
    assert!(result.is_err());
}

#[test]
fn test_missing_transport_and_proxy_url_collected_together() {
    let config = record(json!({
        "id": "s5",
        "name": "half",
        "connectionType": "proxy",
        "customHeaders": [{"name": "Authorization", "value": "Bearer"}]
    }));

    let result = validate_server_config(&config);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 3);
    assert_eq!(result.errors[0], "Transport type is required");
    assert_eq!(result.errors[1], "Proxy URL is required for proxy connection");
    assert!(result.errors[2].contains("bearer token is missing"));
}
