//! Subcommands module for the comware-push CLI

pub mod apply;
pub mod plan;

use crate::cli::output::OutputFormatter;
use clap::Args;
use comware_push::config::Config;
use comware_push::error::{Error, Result};
use comware_push::modules::{ModuleContext, ModuleOutput, ModuleParams, ModuleRegistry};
use std::path::PathBuf;

/// Name of the module both subcommands drive
pub const MODULE_NAME: &str = "comware_install_config";

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Check mode (no device session)
    pub check_mode: bool,
    /// Diff mode
    pub diff_mode: bool,
    /// Verbosity level
    pub verbosity: u8,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.colors.enabled;
        let output = OutputFormatter::new(use_color, cli.is_json(), cli.verbosity());

        Self {
            config,
            output,
            check_mode: cli.check_mode,
            diff_mode: cli.diff_mode,
            verbosity: cli.verbosity(),
        }
    }

    /// Run the push module on a blocking thread.
    ///
    /// The module drives its own single-threaded runtime for the device
    /// session, which must not be nested inside this one.
    pub async fn run_module(&self, params: ModuleParams, check_mode: bool) -> Result<ModuleOutput> {
        let context = ModuleContext::new()
            .with_check_mode(check_mode)
            .with_diff_mode(self.diff_mode);

        tokio::task::spawn_blocking(move || {
            ModuleRegistry::with_builtins().execute(MODULE_NAME, &params, &context)
        })
        .await
        .map_err(|e| Error::Other {
            message: format!("module task failed: {}", e),
            source: Some(Box::new(e)),
        })?
        .map_err(|e| Error::from_module(MODULE_NAME, e))
    }
}

/// Arguments describing the configuration to push and what it replaces
#[derive(Args, Debug, Clone)]
pub struct ConfigSourceArgs {
    /// New full configuration file
    #[arg(required = true)]
    pub config_file: PathBuf,

    /// Configuration file pushed last time
    #[arg(long, short = 'P')]
    pub previous_config_file: Option<PathBuf>,

    /// Previous configuration given inline; wins over --previous-config-file
    #[arg(long)]
    pub previous_config_content: Option<String>,

    /// Push the file as is, without undoing removed objects
    #[arg(long)]
    pub is_delete: bool,

    /// Command type: config, or display (alias show)
    #[arg(long = "type", default_value = "config", value_parser = ["config", "display", "show"])]
    pub command_type: String,
}

impl ConfigSourceArgs {
    /// Module parameters for the configuration source
    pub fn to_params(&self) -> ModuleParams {
        let mut params = ModuleParams::new();
        params.insert("type".into(), serde_json::json!(self.command_type));
        params.insert(
            "config_file".into(),
            serde_json::json!(self.config_file.to_string_lossy()),
        );
        params.insert("is_delete".into(), serde_json::json!(self.is_delete));

        if let Some(path) = &self.previous_config_file {
            params.insert(
                "previous_config_file".into(),
                serde_json::json!(path.to_string_lossy()),
            );
        }
        if let Some(content) = &self.previous_config_content {
            params.insert(
                "previous_config_content".into(),
                serde_json::json!(content),
            );
        }
        params
    }
}

/// String array stored under `key` in the module output
pub fn output_lines(output: &ModuleOutput, key: &str) -> Vec<String> {
    output
        .data
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
