//! Plan command - show what a push would send
//!
//! Always offline: the module runs in check mode, so no credentials are needed.

use super::{output_lines, CommandContext, ConfigSourceArgs};
use crate::cli::output::PushStatus;
use anyhow::Result;
use clap::Parser;
use comware_push::modules::network::NO_CHANGES;

/// Arguments for the plan command
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,
}

impl PlanArgs {
    /// Execute the plan command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let label = self.source.config_file.display().to_string();
        ctx.output.banner(&format!("PLAN: {}", label));

        let output = ctx.run_module(self.source.to_params(), true).await?;
        ctx.output.module_output(&label, &output);

        ctx.output.section("Changed lines");
        ctx.output
            .changed_lines(&output_lines(&output, "list_diff"));

        let undo = output_lines(&output, "undo_commands");
        if undo.is_empty() {
            ctx.output.info("No undo commands required");
        } else {
            ctx.output.list("Undo commands", &undo);
        }

        let commands = output_lines(&output, "commands");
        ctx.output.list("Commands", &commands);

        if commands.first().map(String::as_str) == Some(NO_CHANGES) {
            ctx.output
                .push_result(&label, PushStatus::Ok, "No configuration changes detected");
        } else {
            ctx.output.push_result(
                &label,
                PushStatus::Changed,
                &format!("{} commands planned", commands.len()),
            );
        }
        Ok(0)
    }
}
