//! Result records produced by diagnostic probes.
//!
//! Probes never fail to their caller; every outcome, including errors, is
//! expressed as one of these values so UI code can render it directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::server::TransportType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

/// Counts of what a server exposes, computed by the health check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesSummary {
    pub has_tools: bool,
    pub tool_count: usize,
    pub has_resources: bool,
    pub resource_count: usize,
    pub has_prompts: bool,
    pub prompt_count: usize,
}

impl CapabilitiesSummary {
    pub fn from_counts(tools: usize, resources: usize, prompts: usize) -> Self {
        Self {
            has_tools: tools > 0,
            tool_count: tools,
            has_resources: resources > 0,
            resource_count: resources,
            has_prompts: prompts > 0,
            prompt_count: prompts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: String,
    /// Opaque initialize result reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilitiesSummary>,
}

impl HealthCheckResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
            server_info: None,
            capabilities: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    None,
    Bearer,
    OAuth,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResult {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,
    pub requires_auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthCheckResult {
    /// The endpoint answered without asking for credentials
    pub fn open() -> Self {
        Self {
            is_authenticated: true,
            auth_type: Some(AuthType::None),
            requires_auth: false,
            error: None,
        }
    }

    pub fn requires(auth_type: Option<AuthType>, message: impl Into<String>) -> Self {
        Self {
            is_authenticated: false,
            auth_type,
            requires_auth: true,
            error: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_authenticated: false,
            auth_type: None,
            requires_auth: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportDetectionResult {
    pub supported_types: Vec<TransportType>,
    pub recommended: TransportType,
    /// Failure message per transport that could not be used
    pub errors: BTreeMap<TransportType, String>,
}

impl TransportDetectionResult {
    pub fn supports(&self, transport: TransportType) -> bool {
        self.supported_types.contains(&transport)
    }
}

/// Outcome of probing a proxy's `/health` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHealthResult {
    pub status: HealthStatus,
    pub message: String,
}

impl ProxyHealthResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
