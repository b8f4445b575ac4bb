use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HoardError, Result};

/// Top-level configuration.
///
/// Loaded from `~/.hoard/config.toml` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub middleware: MiddlewareConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl HoardConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HoardConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Write the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HoardError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which actions trigger a save, and how saves are paced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Action types that never trigger a save. LOAD and SAVE are always
    /// added on top of this list.
    pub blacklist: Vec<String>,
    /// Action types allowed to trigger a save. Empty means all.
    pub whitelist: Vec<String>,
    /// Skip dispatching the SAVE action after a successful save.
    pub disable_dispatch_save_action: bool,
    /// Quiet period in milliseconds before a save fires.
    pub debounce_ms: u64,
}

impl MiddlewareConfig {
    pub fn options(&self) -> MiddlewareOptions {
        MiddlewareOptions {
            disable_dispatch_save_action: self.disable_dispatch_save_action,
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

/// Runtime options of the storage middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiddlewareOptions {
    pub disable_dispatch_save_action: bool,
    /// Zero means every qualifying action schedules its own save.
    pub debounce: Duration,
}

impl MiddlewareOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn without_save_action(mut self) -> Self {
        self.disable_dispatch_save_action = true;
        self
    }
}

/// Where and what the JSON file engine persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// State file location. A leading `~/` expands to the home directory.
    pub path: String,
    /// Top-level state keys to persist. Empty means all.
    pub key_whitelist: Vec<String>,
    /// Top-level state keys never persisted.
    pub key_blacklist: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.hoard/state.json".to_string(),
            key_whitelist: vec![],
            key_blacklist: vec![],
        }
    }
}

impl StorageConfig {
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(rest) = self.path.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.path)
    }

    /// Whether any key filtering is configured.
    pub fn filters_keys(&self) -> bool {
        !self.key_whitelist.is_empty() || !self.key_blacklist.is_empty()
    }
}
