//! Connection configuration module
//!
//! Describes how to reach one switch: address, credentials and timeouts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::ConnectionError;

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default connect and command timeout in seconds
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Connection settings for a single device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname or IP address of the device
    pub hostname: Option<String>,

    /// Port to connect to
    pub port: Option<u16>,

    /// Username for authentication
    pub user: Option<String>,

    /// Password for authentication
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Path to private key file
    pub identity_file: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout: Option<u64>,

    /// Reject devices missing from known_hosts
    #[serde(default)]
    pub strict_host_key_checking: bool,

    /// Alternative known_hosts file
    pub user_known_hosts_file: Option<String>,
}

impl HostConfig {
    /// Create a new host config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set hostname
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set identity file
    pub fn identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Set connection timeout
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set strict host key checking
    pub fn strict_host_key_checking(mut self, strict: bool) -> Self {
        self.strict_host_key_checking = strict;
        self
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Get the connection timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout.unwrap_or(DEFAULT_TIMEOUT))
    }

    /// `user@host:port`, used to label the session in logs
    pub fn identifier(&self) -> String {
        format!(
            "{}@{}:{}",
            self.user.as_deref().unwrap_or("-"),
            self.hostname.as_deref().unwrap_or("-"),
            self.port_or_default()
        )
    }

    /// Known hosts file used to verify device keys
    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        match &self.user_known_hosts_file {
            Some(path) => Some(expand_path(path)),
            None => dirs::home_dir().map(|h| h.join(".ssh").join("known_hosts")),
        }
    }

    /// Ensure the settings are complete enough to open a session
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.hostname.as_deref().map_or(true, str::is_empty) {
            return Err(ConnectionError::InvalidConfig(
                "hostname is required".to_string(),
            ));
        }
        if self.user.as_deref().map_or(true, str::is_empty) {
            return Err(ConnectionError::InvalidConfig(
                "username is required".to_string(),
            ));
        }
        if self.password.is_none() && self.identity_file.is_none() {
            return Err(ConnectionError::InvalidConfig(
                "either a password or an identity file is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand a path with ~ and environment variables
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or_else(|_| path.into());
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_builder() {
        let config = HostConfig::new()
            .hostname("leaf-1.dc1")
            .port(2222)
            .user("admin")
            .password("secret")
            .timeout(60);

        assert_eq!(config.hostname, Some("leaf-1.dc1".to_string()));
        assert_eq!(config.port_or_default(), 2222);
        assert_eq!(config.timeout_duration(), Duration::from_secs(60));
        assert_eq!(config.identifier(), "admin@leaf-1.dc1:2222");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::new();
        assert_eq!(config.port_or_default(), DEFAULT_PORT);
        assert_eq!(config.timeout_duration(), Duration::from_secs(DEFAULT_TIMEOUT));
        assert!(!config.strict_host_key_checking);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let missing_host = HostConfig::new().user("admin").password("x");
        assert!(matches!(
            missing_host.validate(),
            Err(ConnectionError::InvalidConfig(_))
        ));

        let missing_secret = HostConfig::new().hostname("10.0.0.1").user("admin");
        assert!(missing_secret.validate().is_err());

        let with_key = HostConfig::new()
            .hostname("10.0.0.1")
            .user("admin")
            .identity_file("~/.ssh/id_ed25519");
        assert!(with_key.validate().is_ok());
    }

    #[test]
    fn test_password_not_serialized() {
        let config = HostConfig::new().hostname("sw1").password("hunter2");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("/etc/comware-push/comware-push.cfg");
        assert_eq!(path, PathBuf::from("/etc/comware-push/comware-push.cfg"));
    }
}
