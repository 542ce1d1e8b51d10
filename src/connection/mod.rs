//! Connection layer for device communication.
//!
//! Network operating systems expose their CLI as an interactive shell rather
//! than as a command executor, so a [`Connection`] here runs a *script*: a
//! block of CLI lines written to the device in one go, with the combined
//! output returned once the device closes the session channel.
//!
//! # Supported Transports
//!
//! - **SSH** via `russh` (pure Rust, `russh` feature, default)
//!
//! # Example
//!
//! ```rust,ignore
//! use comware_push::connection::{HostConfig, RusshConnection, ExecuteOptions};
//!
//! let host = HostConfig::new()
//!     .hostname("192.0.2.10")
//!     .user("admin")
//!     .password("secret");
//! let conn = RusshConnection::connect(&host).await?;
//!
//! let result = conn
//!     .execute("display version\nquit", Some(ExecuteOptions::new().with_timeout(30)))
//!     .await?;
//! println!("{}", result.stdout);
//! ```

/// Connection configuration types.
pub mod config;

/// Pure Rust SSH implementation using russh.
#[cfg(feature = "russh")]
pub mod russh;

use async_trait::async_trait;
use thiserror::Error;

pub use config::HostConfig;

#[cfg(feature = "russh")]
pub use self::russh::RusshConnection;

/// Russh-related error type, wraps russh::Error for the client Handler trait
#[cfg(feature = "russh")]
#[derive(Debug)]
pub struct RusshError(pub ::russh::Error);

#[cfg(feature = "russh")]
impl From<::russh::Error> for RusshError {
    fn from(err: ::russh::Error) -> Self {
        RusshError(err)
    }
}

#[cfg(feature = "russh")]
impl std::fmt::Display for RusshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Russh error: {}", self.0)
    }
}

#[cfg(feature = "russh")]
impl std::error::Error for RusshError {}

#[cfg(feature = "russh")]
impl From<::russh::Error> for ConnectionError {
    fn from(err: ::russh::Error) -> Self {
        ConnectionError::SshError(format!("Russh error: {}", err))
    }
}

/// Errors that can occur during connection operations.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to establish initial connection to the device.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication was rejected by the device.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The script could not be run, or the device rejected a command.
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Connection or operation timed out.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// The specified host could not be resolved.
    #[error("Host not found: {0}")]
    HostNotFound(String),

    /// Configuration is invalid or incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// SSH-specific error from the underlying implementation.
    #[error("SSH error: {0}")]
    SshError(String),

    /// I/O error during connection operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The session is not open.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// The result of running a script on a connection.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code reported by the device (0 when none was reported).
    pub exit_code: i32,
    /// Content written to standard output.
    pub stdout: String,
    /// Content written to standard error.
    pub stderr: String,
    /// Convenience flag: `true` if `exit_code == 0`.
    pub success: bool,
}

impl CommandResult {
    /// Create a new successful command result
    pub fn success(stdout: String, stderr: String) -> Self {
        Self {
            exit_code: 0,
            stdout,
            stderr,
            success: true,
        }
    }

    /// Create a new failed command result
    pub fn failure(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success: false,
        }
    }

    /// Get the combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Options for script execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Timeout in seconds (None for no timeout)
    pub timeout: Option<u64>,
}

impl ExecuteOptions {
    /// Create new execute options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The main connection trait that all transport implementations must implement
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the connection identifier (`user@host:port`)
    fn identifier(&self) -> &str;

    /// Check if the connection is still alive
    async fn is_alive(&self) -> bool;

    /// Run a CLI script on the device.
    ///
    /// `script` holds one command per line. The script must end the CLI
    /// session itself (for example with `quit`), otherwise the call only
    /// returns once the timeout elapses.
    async fn execute(
        &self,
        script: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult>;

    /// Close the connection
    async fn close(&self) -> ConnectionResult<()>;
}
