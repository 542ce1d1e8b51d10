//! Common network device utilities and types
//!
//! This module provides shared functionality for network device modules:
//! - Comware CLI command generation
//! - The [`DeviceSession`] abstraction used by modules to reach a switch
//! - [`ComwareDevice`], a session backed by a [`Connection`]
//! - Device output inspection and configuration checksums

use crate::connection::{
    CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions, HostConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

// ============================================================================
// Command Generation
// ============================================================================

/// Generate platform-specific command sequences
pub trait ConfigCommandGenerator {
    /// Commands to enter configuration mode
    fn enter_config_mode(&self) -> Vec<String>;

    /// Commands to exit configuration mode
    fn exit_config_mode(&self) -> Vec<String>;

    /// Commands that make the CLI script-friendly (e.g. disable paging)
    fn prepare_session(&self) -> Vec<String>;

    /// Commands ending the CLI session
    fn logout(&self) -> Vec<String>;

    /// Full script applying configuration lines
    fn apply_config_lines(&self, lines: &[String]) -> Vec<String> {
        let mut commands = self.prepare_session();
        commands.extend(self.enter_config_mode());
        commands.extend(lines.iter().cloned());
        commands.extend(self.exit_config_mode());
        commands.extend(self.logout());
        commands
    }

    /// Full script running display commands
    fn display_lines(&self, lines: &[String]) -> Vec<String> {
        let mut commands = self.prepare_session();
        commands.extend(lines.iter().cloned());
        commands.extend(self.logout());
        commands
    }
}

/// HPE/H3C Comware 7 command generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ComwareCommandGenerator;

impl ConfigCommandGenerator for ComwareCommandGenerator {
    fn enter_config_mode(&self) -> Vec<String> {
        vec!["system-view".to_string()]
    }

    fn exit_config_mode(&self) -> Vec<String> {
        vec!["return".to_string()]
    }

    fn prepare_session(&self) -> Vec<String> {
        vec!["screen-length disable".to_string()]
    }

    fn logout(&self) -> Vec<String> {
        vec!["quit".to_string()]
    }
}

// ============================================================================
// Device Output Inspection
// ============================================================================

/// Comware prefixes CLI error messages with `%`, e.g.
/// `% Unrecognized command found at '^' position.`
const CLI_ERROR_MARKER: char = '%';

/// First line of device output reporting a rejected command
pub fn find_cli_error(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(CLI_ERROR_MARKER))
}

/// Calculate SHA256 checksum of configuration content
pub fn calculate_config_checksum(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Device Session
// ============================================================================

/// An open-able CLI session with one switch.
///
/// Batches are sent whole: `cli_display` runs read-only commands,
/// `cli_config` applies configuration lines. Both return the device output.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Identifies the device in logs
    fn identifier(&self) -> &str;

    async fn open(&self) -> ConnectionResult<()>;

    async fn cli_display(&self, commands: &[String]) -> ConnectionResult<String>;

    async fn cli_config(&self, commands: &[String]) -> ConnectionResult<String>;

    /// Release the session. Closing a session that is not open is a no-op.
    async fn close(&self) -> ConnectionResult<()>;
}

/// A Comware switch reached over a [`Connection`]
pub struct ComwareDevice {
    host: HostConfig,
    identifier: String,
    connection: RwLock<Option<Arc<dyn Connection>>>,
    generator: ComwareCommandGenerator,
}

impl ComwareDevice {
    /// A device that connects on [`open`](DeviceSession::open)
    pub fn new(host: HostConfig) -> Self {
        let identifier = host.identifier();
        Self {
            host,
            identifier,
            connection: RwLock::new(None),
            generator: ComwareCommandGenerator,
        }
    }

    /// A device over an already established connection
    pub fn with_connection(host: HostConfig, connection: Arc<dyn Connection>) -> Self {
        Self {
            identifier: connection.identifier().to_string(),
            host,
            connection: RwLock::new(Some(connection)),
            generator: ComwareCommandGenerator,
        }
    }

    #[cfg(feature = "russh")]
    async fn connect(&self) -> ConnectionResult<Arc<dyn Connection>> {
        let connection = crate::connection::RusshConnection::connect(&self.host).await?;
        Ok(Arc::new(connection))
    }

    #[cfg(not(feature = "russh"))]
    async fn connect(&self) -> ConnectionResult<Arc<dyn Connection>> {
        Err(ConnectionError::InvalidConfig(
            "No SSH backend available. Enable the 'russh' feature.".to_string(),
        ))
    }

    async fn run_script(&self, script: Vec<String>) -> ConnectionResult<String> {
        let connection = self
            .connection
            .read()
            .await
            .clone()
            .ok_or(ConnectionError::ConnectionClosed)?;

        let options = ExecuteOptions::new().with_timeout(self.host.timeout_duration().as_secs());
        let result = connection.execute(&script.join("\n"), Some(options)).await?;
        Self::check_result(result)
    }

    fn check_result(result: CommandResult) -> ConnectionResult<String> {
        if !result.success {
            return Err(ConnectionError::ExecutionFailed(format!(
                "device session ended with exit code {}: {}",
                result.exit_code,
                result.combined_output().trim()
            )));
        }
        if let Some(error) = find_cli_error(&result.stdout) {
            return Err(ConnectionError::ExecutionFailed(format!(
                "device rejected a command: {}",
                error
            )));
        }
        Ok(result.stdout)
    }
}

#[async_trait]
impl DeviceSession for ComwareDevice {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn open(&self) -> ConnectionResult<()> {
        let mut slot = self.connection.write().await;
        if let Some(existing) = slot.as_ref() {
            if existing.is_alive().await {
                return Ok(());
            }
        }

        debug!(device = %self.identifier, "Opening device session");
        *slot = Some(self.connect().await?);
        Ok(())
    }

    async fn cli_display(&self, commands: &[String]) -> ConnectionResult<String> {
        debug!(device = %self.identifier, count = commands.len(), "Sending display commands");
        self.run_script(self.generator.display_lines(commands)).await
    }

    async fn cli_config(&self, commands: &[String]) -> ConnectionResult<String> {
        debug!(device = %self.identifier, count = commands.len(), "Sending configuration");
        self.run_script(self.generator.apply_config_lines(commands))
            .await
    }

    async fn close(&self) -> ConnectionResult<()> {
        let connection = self.connection.write().await.take();
        match connection {
            Some(connection) => {
                debug!(device = %self.identifier, "Closing device session");
                connection.close().await.inspect_err(|e| {
                    warn!(device = %self.identifier, error = %e, "Failed to close session cleanly")
                })
            }
            None => Ok(()),
        }
    }
}
