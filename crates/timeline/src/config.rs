use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Navigation feel, `[navigation]` in `droste.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Accumulated wheel delta that switches frames, applied in both directions
    pub switch_threshold: f64,

    /// Input lock after a switch
    pub cooldown_ms: u64,

    /// Zoom added per unit of positive accumulated delta
    pub zoom_gain: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            switch_threshold: 2000.0,
            cooldown_ms: 300,
            zoom_gain: 0.001,
        }
    }
}

impl NavigatorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
