//! Admin channel connection settings

use serde::{Deserialize, Serialize};

/// Where the admin channel lives and how often it is polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server base URL; `http`/`https` are mapped to `ws`/`wss`
    pub url: String,
    /// Seconds between pings
    pub probe_interval_seconds: u64,
    /// Seconds between request log pulls
    pub tail_interval_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/admin".to_string(),
            probe_interval_seconds: 3,
            tail_interval_seconds: 3,
        }
    }
}
