//! Service configuration loading.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, `GHRSST_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use grid_query::EngineConfig;
use serde::{Deserialize, Serialize};

/// Default location of the YAML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/ghrsst.yaml";

/// Configuration for the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root directory of the Zarr store.
    pub zarr_path: PathBuf,

    /// Persisted bounds index; `None` disables the file cache.
    pub index_json: Option<PathBuf>,

    /// Seconds between background bounds rescans (also the cache lifetime).
    pub bounds_refresh_secs: u64,

    /// Engine limits.
    pub engine: EngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            zarr_path: PathBuf::from("data/mur.zarr"),
            index_json: Some(PathBuf::from("data/mur.zarr/latest.json")),
            bounds_refresh_secs: 300,
            engine: EngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a YAML file, then apply environment overrides.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {:?}", path))?;
            Self::from_yaml(&content).with_context(|| format!("Failed to parse: {:?}", path))?
        } else {
            tracing::warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML content.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override fields from `GHRSST_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("GHRSST_ZARR_PATH") {
            self.zarr_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("GHRSST_INDEX_JSON") {
            self.index_json = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        if let Ok(val) = std::env::var("GHRSST_BOUNDS_REFRESH_SECS") {
            if let Ok(secs) = val.parse() {
                self.bounds_refresh_secs = secs;
            }
        }

        self.engine.apply_env();
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid engine config: {}", e))?;
        if self.bounds_refresh_secs == 0 {
            anyhow::bail!("bounds_refresh_secs must be > 0");
        }
        Ok(())
    }

    pub fn bounds_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.bounds_refresh_secs)
    }
}
