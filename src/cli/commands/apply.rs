//! Apply command - push a configuration file to a switch

use super::{output_lines, CommandContext, ConfigSourceArgs};
use crate::cli::output::PushStatus;
use anyhow::Result;
use clap::Parser;
use comware_push::error::Error;
use comware_push::modules::ModuleOutput;

/// Arguments for the apply command
#[derive(Parser, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,

    /// Switch address
    #[arg(long, short = 'H', required = true)]
    pub hostname: String,

    /// Login user (falls back to the configuration file)
    #[arg(long, short = 'u', env = "COMWARE_PUSH_USER")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, short = 'p', env = "COMWARE_PUSH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// SSH port (falls back to the configuration file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect and command timeout in seconds (falls back to the configuration file)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ApplyArgs {
    /// Execute the apply command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let mut params = self.source.to_params();
        params.insert("hostname".into(), serde_json::json!(self.hostname));

        let username = self
            .username
            .clone()
            .or_else(|| ctx.config.device.username.clone());
        if let Some(username) = username {
            params.insert("username".into(), serde_json::json!(username));
        }
        if let Some(password) = &self.password {
            params.insert("password".into(), serde_json::json!(password));
        }
        params.insert(
            "port".into(),
            serde_json::json!(self.port.unwrap_or(ctx.config.device.port)),
        );
        params.insert(
            "timeout".into(),
            serde_json::json!(self.timeout.unwrap_or(ctx.config.device.timeout)),
        );

        ctx.output.banner(&format!("COMWARE PUSH: {}", self.hostname));
        if ctx.check_mode {
            ctx.output
                .warning("Running in CHECK MODE - no session will be opened");
        }
        ctx.output.info(&format!(
            "Pushing {}",
            self.source.config_file.display()
        ));

        let output = match ctx.run_module(params, ctx.check_mode).await {
            Ok(output) => output,
            Err(e) => {
                let status = if matches!(e, Error::DeviceUnavailable(_)) {
                    PushStatus::Unreachable
                } else {
                    PushStatus::Failed
                };
                ctx.output.push_result(&self.hostname, status, "push aborted");
                return Err(e.into());
            }
        };
        self.report(ctx, &output);
        ctx.output.elapsed();
        Ok(0)
    }

    fn report(&self, ctx: &CommandContext, output: &ModuleOutput) {
        ctx.output.module_output(&self.hostname, output);

        if ctx.diff_mode {
            ctx.output.section("Changed lines");
            ctx.output
                .changed_lines(&output_lines(output, "list_diff"));
        }

        let undo = output_lines(output, "undo_commands");
        if !undo.is_empty() {
            ctx.output.list("Undo commands", &undo);
        }
        if ctx.verbosity >= 1 {
            ctx.output
                .list("Commands", &output_lines(output, "commands"));
        }
        if let Some(response) = output.data.get("response").and_then(|r| r.as_str()) {
            ctx.output.debug(&format!("Device response:\n{}", response));
        }

        ctx.output
            .push_result(&self.hostname, PushStatus::from(output.status), &output.msg);
    }
}
