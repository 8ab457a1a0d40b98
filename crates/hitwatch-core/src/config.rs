use serde::{Deserialize, Serialize};

/// Default surge threshold in hits per second.
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// Alert engine settings. Fixed for the lifetime of a [`crate::Window`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Average hits/second over the rolling window that must be exceeded
    /// to raise an alert.
    pub threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}
