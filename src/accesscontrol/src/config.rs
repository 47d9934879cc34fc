//! Access control configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Access control service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// When false, access checks fall back to legacy org-role checks
    pub enabled: bool,

    /// Deadline applied to evaluations whose context has none
    pub resolver_timeout_ms: Option<u64>,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolver_timeout_ms: None,
        }
    }
}

impl AccessControlConfig {
    /// Default evaluation timeout, if configured
    pub fn resolver_timeout(&self) -> Option<Duration> {
        self.resolver_timeout_ms.map(Duration::from_millis)
    }
}
