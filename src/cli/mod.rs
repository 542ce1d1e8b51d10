//! CLI module for comware-push
//!
//! Argument parsing and subcommand dispatch.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// comware-push - push full configurations to Comware 7 switches
///
/// Removed service instances, VPN instances, VSIs and tunnel interfaces are
/// undone before the new configuration is merged.
#[derive(Parser, Debug, Clone)]
#[command(name = "comware-push")]
#[command(version)]
#[command(about = "Push full configurations to Comware 7 switches", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Compute the command batch without opening a device session
    #[arg(long = "check", global = true)]
    pub check_mode: bool,

    /// Show the edit script between the previous and new configuration
    #[arg(long = "diff", global = true)]
    pub diff_mode: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "COMWARE_PUSH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Push a configuration file to a switch
    Apply(commands::apply::ApplyArgs),

    /// Show the commands a push would send, without connecting
    Plan(commands::plan::PlanArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "comware-push",
            "apply",
            "--hostname",
            "10.0.0.1",
            "new.cfg",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Apply(_)));
        assert!(!cli.check_mode);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "comware-push",
            "plan",
            "new.cfg",
            "-vvvv",
            "--diff",
            "--output",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Plan(_)));
        assert_eq!(cli.verbosity(), 3);
        assert!(cli.diff_mode);
        assert!(cli.is_json());
    }

    #[test]
    fn test_apply_requires_hostname() {
        assert!(Cli::try_parse_from(["comware-push", "apply", "new.cfg"]).is_err());
    }
}
