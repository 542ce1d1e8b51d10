//! Configuration module for comware-push
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/comware-push/comware-push.cfg)
//! - User configuration (~/.comware-push.cfg)
//! - Project configuration (./comware-push.cfg)
//! - Environment variables
//!
//! Command-line flags are applied on top by the binary.

use crate::connection::config::{DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::error::{ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "COMWARE_PUSH_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device connection defaults
    pub device: DeviceDefaults,

    /// Colors and output settings
    pub colors: ColorsConfig,
}

/// Defaults used when a flag is not given on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDefaults {
    /// Login user
    pub username: Option<String>,

    /// SSH port
    pub port: u16,

    /// Connect and command timeout in seconds
    pub timeout: u64,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        Self {
            username: None,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colored output
    pub enabled: bool,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the first existing standard location (or the
    /// explicit path), then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = Self::config_paths(config_path)
            .into_iter()
            .find(|p| p.exists())
        {
            tracing::debug!(path = %path.display(), "Loading configuration file");
            config = config.merge_from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Candidate configuration files, highest priority first
    fn config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();
        if let Ok(env_config) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(env_config));
        }
        paths.push(PathBuf::from("/etc/comware-push/comware-push.cfg"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".comware-push.cfg"));
        }
        paths.push(PathBuf::from("comware-push.cfg"));
        paths
    }

    /// Load a configuration from a file and merge it into this one
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => {
                // .cfg and friends: TOML first, then YAML
                match toml::from_str(&content) {
                    Ok(config) => config,
                    Err(_) => serde_yaml::from_str(&content).with_context(|| {
                        format!("Failed to parse config file: {}", path.display())
                    })?,
                }
            }
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; values that differ from the
    /// defaults in `other` win
    fn merge(&self, other: Config) -> Config {
        let defaults = DeviceDefaults::default();
        Config {
            device: DeviceDefaults {
                username: other
                    .device
                    .username
                    .or_else(|| self.device.username.clone()),
                port: if other.device.port != defaults.port {
                    other.device.port
                } else {
                    self.device.port
                },
                timeout: if other.device.timeout != defaults.timeout {
                    other.device.timeout
                } else {
                    self.device.timeout
                },
            },
            colors: ColorsConfig {
                enabled: other.colors.enabled && self.colors.enabled,
            },
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `COMWARE_PUSH_*` and `NO_COLOR` overrides from `lookup`.
    /// Unparseable numbers are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(user) = lookup("COMWARE_PUSH_USER") {
            self.device.username = Some(user);
        }

        if let Some(port) = lookup("COMWARE_PUSH_PORT").and_then(|p| p.parse().ok()) {
            self.device.port = port;
        }

        if let Some(timeout) = lookup("COMWARE_PUSH_TIMEOUT").and_then(|t| t.parse().ok()) {
            self.device.timeout = timeout;
        }

        if lookup("NO_COLOR").is_some() {
            self.colors.enabled = false;
        }
    }

    /// Load configuration from a specific file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.port, 22);
        assert_eq!(config.device.timeout, 30);
        assert!(config.device.username.is_none());
        assert!(config.colors.enabled);
    }

    #[test]
    fn test_config_merge() {
        let base = Config {
            device: DeviceDefaults {
                username: Some("admin".to_string()),
                timeout: 60,
                ..DeviceDefaults::default()
            },
            ..Config::default()
        };
        let other = Config {
            device: DeviceDefaults {
                port: 2222,
                ..DeviceDefaults::default()
            },
            ..Config::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.device.username.as_deref(), Some("admin"));
        assert_eq!(merged.device.port, 2222);
        assert_eq!(merged.device.timeout, 60);
    }

    #[test]
    fn test_env_override() {
        let env: HashMap<&str, &str> = [
            ("COMWARE_PUSH_USER", "netops"),
            ("COMWARE_PUSH_PORT", "not-a-port"),
            ("COMWARE_PUSH_TIMEOUT", "90"),
            ("NO_COLOR", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.device.username.as_deref(), Some("netops"));
        assert_eq!(config.device.port, 22);
        assert_eq!(config.device.timeout, 90);
        assert!(!config.colors.enabled);
    }

    #[test]
    fn test_load_toml_cfg() {
        let mut file = tempfile::Builder::new().suffix(".cfg").tempfile().unwrap();
        writeln!(file, "[device]\nusername = \"admin\"\nport = 2022\n\n[colors]\nenabled = false").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.device.username.as_deref(), Some("admin"));
        assert_eq!(config.device.port, 2022);
        assert_eq!(config.device.timeout, 30);
        assert!(!config.colors.enabled);
    }

    #[test]
    fn test_load_yaml_cfg() {
        let mut file = tempfile::Builder::new().suffix(".cfg").tempfile().unwrap();
        writeln!(file, "device:\n  timeout: 45").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.device.timeout, 45);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"device": {{"username": "ops"}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.device.username.as_deref(), Some("ops"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "device = [").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/custom.cfg");
        assert_eq!(Config::config_paths(Some(&explicit)), vec![explicit]);
    }
}
