//! Configuration for the operations layer.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &["sibling_concurrency", "enable_nodes", "default_description"];

/// Configuration for scenegraft operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum sibling subtrees built concurrently per parent (0 = unbounded).
    #[serde(default)]
    pub sibling_concurrency: usize,

    /// Whether created nodes start enabled.
    #[serde(default = "default_enable_nodes")]
    pub enable_nodes: bool,

    /// Description file used when a command is given no path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<PathBuf>,
}

fn default_enable_nodes() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sibling_concurrency: 0,
            enable_nodes: default_enable_nodes(),
            default_description: None,
        }
    }
}

impl Config {
    /// Load configuration from disk with environment overrides.
    pub fn load() -> OpsResult<Self> {
        let config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Load configuration from a specific file, without environment overrides.
    pub fn load_from(path: &Path) -> OpsResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `SG_*` environment variables on top of this configuration.
    pub fn with_env_overrides(mut self) -> OpsResult<Self> {
        if let Ok(value) = std::env::var("SG_SIBLING_CONCURRENCY") {
            self.set("sibling_concurrency", &value)?;
        }
        if let Ok(value) = std::env::var("SG_ENABLE_NODES") {
            self.set("enable_nodes", &value)?;
        }
        if let Ok(value) = std::env::var("SG_DESCRIPTION") {
            self.set("default_description", &value)?;
        }
        Ok(self)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> OpsResult<()> {
        if let Some(path) = Self::config_file_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> OpsResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "scenegraft", "sg").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Resolve the description to use, preferring an explicit path.
    pub fn resolve_description(&self, explicit: Option<PathBuf>) -> OpsResult<PathBuf> {
        explicit
            .or_else(|| self.default_description.clone())
            .ok_or(OpsError::NoDescription)
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "sibling_concurrency" => Some(self.sibling_concurrency.to_string()),
            "enable_nodes" => Some(self.enable_nodes.to_string()),
            "default_description" => self
                .default_description
                .as_ref()
                .map(|path| path.display().to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> OpsResult<()> {
        match key {
            "sibling_concurrency" => {
                self.sibling_concurrency = value
                    .parse()
                    .map_err(|_| OpsError::Config(format!("Invalid number: {}", value)))?;
            }
            "enable_nodes" => {
                self.enable_nodes = match value {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => return Err(OpsError::Config(format!("Invalid boolean: {}", value))),
                };
            }
            "default_description" => {
                self.default_description = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => {
                return Err(OpsError::Config(format!(
                    "Unknown config key: {}. Valid keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}
