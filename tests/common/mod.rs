//! Shared test utilities and fixtures for the comware-push test suite.
//!
//! This module provides:
//! - A mock [`Connection`] that records the scripts it is handed
//! - A mock [`DeviceSession`] that records opens, closes and batches
//! - Temporary configuration file helpers
//! - Parameter builders for the push module
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tempfile::TempDir;

use comware_push::connection::{
    CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions,
};
use comware_push::modules::network::{CommandType, DeviceSession};
use comware_push::modules::{ModuleContext, ModuleParams};

// ============================================================================
// Mock Connection Implementation
// ============================================================================

/// A mock connection standing in for an SSH session to a switch.
///
/// Every script passed to `execute` is recorded. The result returned is
/// configurable, as is a hard failure on every call.
#[derive(Debug)]
pub struct MockConnection {
    identifier: String,
    alive: AtomicBool,
    scripts: RwLock<Vec<String>>,
    result: RwLock<CommandResult>,
    should_fail: AtomicBool,
    close_count: AtomicU32,
}

impl MockConnection {
    /// Create a new mock connection with the given identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            alive: AtomicBool::new(true),
            scripts: RwLock::new(Vec::new()),
            result: RwLock::new(CommandResult::success(String::new(), String::new())),
            should_fail: AtomicBool::new(false),
            close_count: AtomicU32::new(0),
        }
    }

    /// Set the result returned for every script.
    pub fn set_result(&self, result: CommandResult) {
        *self.result.write() = result;
    }

    /// Answer every script with the given device output.
    pub fn set_output(&self, stdout: &str) {
        self.set_result(CommandResult::success(stdout.to_string(), String::new()));
    }

    /// Configure the mock to fail all executions.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// All scripts that were executed.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.read().clone()
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> u32 {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn execute(
        &self,
        script: &str,
        _options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ConnectionError::ExecutionFailed(
                "Mock connection failed".to_string(),
            ));
        }

        self.scripts.write().push(script.to_string());
        Ok(self.result.read().clone())
    }

    async fn close(&self) -> ConnectionResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Mock Device Session
// ============================================================================

/// A batch handed to a [`MockSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentBatch {
    pub command_type: CommandType,
    pub commands: Vec<String>,
}

/// A device session that never touches the network.
#[derive(Debug, Default)]
pub struct MockSession {
    open_count: AtomicU32,
    close_count: AtomicU32,
    fail_open: AtomicBool,
    fail_execution: AtomicBool,
    batches: RwLock<Vec<SentBatch>>,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `open` fail.
    pub fn failing_open() -> Arc<Self> {
        let session = Self::default();
        session.fail_open.store(true, Ordering::SeqCst);
        Arc::new(session)
    }

    /// Make every batch fail as if the device rejected it.
    pub fn failing_execution() -> Arc<Self> {
        let session = Self::default();
        session.fail_execution.store(true, Ordering::SeqCst);
        Arc::new(session)
    }

    pub fn open_count(&self) -> u32 {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> u32 {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<SentBatch> {
        self.batches.read().clone()
    }

    fn record(&self, command_type: CommandType, commands: &[String]) -> ConnectionResult<String> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(ConnectionError::ExecutionFailed(
                "device rejected a command: % Unrecognized command found at '^' position."
                    .to_string(),
            ));
        }
        self.batches.write().push(SentBatch {
            command_type,
            commands: commands.to_vec(),
        });
        Ok(format!("<mock> {} lines accepted", commands.len()))
    }
}

#[async_trait]
impl DeviceSession for MockSession {
    fn identifier(&self) -> &str {
        "mock-switch"
    }

    async fn open(&self) -> ConnectionResult<()> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(ConnectionError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    async fn cli_display(&self, commands: &[String]) -> ConnectionResult<String> {
        self.record(CommandType::Display, commands)
    }

    async fn cli_config(&self, commands: &[String]) -> ConnectionResult<String> {
        self.record(CommandType::Config, commands)
    }

    async fn close(&self) -> ConnectionResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A temporary directory holding configuration files.
pub struct ConfigFixture {
    dir: TempDir,
}

impl ConfigFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `lines` joined by newlines (with a trailing newline) to `name`.
    pub fn write(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(&path, content).expect("Failed to write config file");
        path
    }
}

impl Default for ConfigFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter builder for `comware_install_config`.
pub struct PushParams {
    params: ModuleParams,
}

impl PushParams {
    /// Config-type push of `config_file`, incremental unless changed.
    pub fn new(config_file: &Path) -> Self {
        let mut params = ModuleParams::new();
        params.insert("type".into(), serde_json::json!("config"));
        params.insert(
            "config_file".into(),
            serde_json::json!(config_file.to_string_lossy()),
        );
        params.insert("is_delete".into(), serde_json::json!(false));
        Self { params }
    }

    pub fn command_type(mut self, command_type: &str) -> Self {
        self.params
            .insert("type".into(), serde_json::json!(command_type));
        self
    }

    pub fn full_replacement(mut self) -> Self {
        self.params.insert("is_delete".into(), serde_json::json!(true));
        self
    }

    pub fn previous_file(mut self, path: &Path) -> Self {
        self.params.insert(
            "previous_config_file".into(),
            serde_json::json!(path.to_string_lossy()),
        );
        self
    }

    pub fn previous_content(mut self, content: &str) -> Self {
        self.params
            .insert("previous_config_content".into(), serde_json::json!(content));
        self
    }

    pub fn build(self) -> ModuleParams {
        self.params
    }
}

/// Module context bound to a mock session.
pub fn context_with(session: &Arc<MockSession>) -> ModuleContext {
    ModuleContext::new().with_device(session.clone())
}

/// String array stored under `key` in the module output data.
pub fn data_lines(output: &comware_push::modules::ModuleOutput, key: &str) -> Vec<String> {
    serde_json::from_value(output.data[key].clone()).expect("expected a string array")
}
