//! Error types for comware-push.
//!
//! Modules report [`ModuleError`]; the binary folds those, together with
//! configuration loading failures, into one [`Error`] that carries a process
//! exit code.

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for comware-push operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for comware-push.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Module Errors
    // ========================================================================
    /// Module not found.
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    /// Invalid module arguments.
    #[error("Invalid arguments for module '{module}': {message}")]
    ModuleArgs {
        /// Module name
        module: String,
        /// Error message
        message: String,
    },

    /// Module execution failed.
    #[error("Module '{module}' execution failed: {message}")]
    ModuleExecution {
        /// Module name
        module: String,
        /// Error message
        message: String,
    },

    /// A required input file is missing or unreadable.
    #[error("{0}")]
    InputMissing(String),

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The device session could not be opened.
    #[error("error during device open: {0}")]
    DeviceUnavailable(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // I/O and Parse Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic error with context.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Wrap a module failure, keeping the module name for context.
    pub fn from_module(module: impl Into<String>, err: ModuleError) -> Self {
        let module = module.into();
        match err {
            ModuleError::NotFound(name) => Error::ModuleNotFound(name),
            ModuleError::InvalidParameter(message) | ModuleError::MissingParameter(message) => {
                Error::ModuleArgs { module, message }
            }
            ModuleError::InputMissing(message) => Error::InputMissing(message),
            ModuleError::DeviceOpen(message) => Error::DeviceUnavailable(message),
            other => Error::ModuleExecution {
                module,
                message: other.to_string(),
            },
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ModuleNotFound(_) | Error::ModuleArgs { .. } | Error::ModuleExecution { .. } => {
                2
            }
            Error::DeviceUnavailable(_) => 3,
            Error::InputMissing(_) | Error::FileNotFound(_) => 4,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
