use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of one pooled connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusEntry {
    pub server_id: String,
    pub server_name: String,
    pub connected: bool,
    pub last_activity: DateTime<Utc>,
}
