//! Synchronizer settings

use serde::{Deserialize, Serialize};

use crate::sync::DEFAULT_REQUEST_LOG_CAPACITY;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Request log entries kept, newest first
    pub request_log_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_log_capacity: DEFAULT_REQUEST_LOG_CAPACITY,
        }
    }
}
