use anyhow::{Context, Result};
use droste_chain::ModelConfig;
use droste_graph::{WalkConfig, DEFAULT_API_URL};
use droste_timeline::NavigatorConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DROSTE_CONFIG";
pub const TOKEN_ENV: &str = "DROSTE_API_TOKEN";
const LOCAL_CONFIG: &str = "droste.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// MediaWiki action API endpoint
    pub api_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Frame store file; defaults to the user data dir
    pub path: Option<PathBuf>,
}

/// `droste.toml`. Every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrosteConfig {
    pub source: SourceConfig,
    pub walk: WalkConfig,
    pub models: ModelConfig,
    pub store: StoreConfig,
    pub navigation: NavigatorConfig,
}

impl DrosteConfig {
    /// Load from `explicit`, then `$DROSTE_CONFIG`, then `./droste.toml`.
    /// Only an explicitly named file has to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        match named {
            Some(path) => Self::from_file(&path),
            None => {
                let local = Path::new(LOCAL_CONFIG);
                if local.exists() {
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(default_store_path)
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("droste"))
        .unwrap_or_else(|| PathBuf::from(".droste"))
        .join("frames.json")
}
