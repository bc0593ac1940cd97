use droste_protocol::Canvas;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model proxy endpoint (create-and-wait prediction API)
pub const DEFAULT_ENDPOINT: &str = "https://itp-ima-replicate-proxy.web.app/api/create_n_get";
pub const COMPOSITION_MODEL: &str = "bytedance/seedream-4";
pub const ANALYSIS_MODEL: &str = "openai/gpt-5";

/// Remote model settings, `[models]` in `droste.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub composition_model: String,
    pub analysis_model: String,

    /// Per-call budget in milliseconds; a timed-out call counts as a failed call
    pub timeout_ms: u64,

    /// Requested composite size label
    pub size: String,
    pub aspect_ratio: String,
    pub max_outputs: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let canvas = Canvas::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            composition_model: COMPOSITION_MODEL.to_string(),
            analysis_model: ANALYSIS_MODEL.to_string(),
            timeout_ms: 120_000,
            size: "2K".to_string(),
            aspect_ratio: "4:3".to_string(),
            max_outputs: 4,
            width: canvas.width,
            height: canvas.height,
        }
    }
}

impl ModelConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}
