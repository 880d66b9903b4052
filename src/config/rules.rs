//! Rule administration settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Give up waiting for a rule response after this many seconds.
    /// Unset means wait indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_timeout_seconds: Option<u64>,
}

impl RulesConfig {
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_seconds.map(Duration::from_secs)
    }
}
