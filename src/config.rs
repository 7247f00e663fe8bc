//! Persisted defaults for the cache and fetch layer.
//!
//! Embedding apps load this once at startup and derive per-call
//! [`FetchPlan`]s from it. Stored at `~/.config/cropcache/config.json`;
//! a missing file yields the defaults.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::fetch::FetchPlan;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "cropcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the platform cache directory when set.
    pub cache_dir: Option<PathBuf>,
    pub max_age_minutes: i64,
    pub retry_budget: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_age_minutes: 60,
            retry_budget: 2,
            retry_base_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory the file-backed cache should live in.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// A fetch plan carrying this config's defaults, with no cache key.
    pub fn default_plan(&self) -> FetchPlan {
        FetchPlan::uncached()
            .with_max_age(Duration::minutes(self.max_age_minutes))
            .with_retries(
                self.retry_budget,
                StdDuration::from_millis(self.retry_base_delay_ms),
            )
    }
}
