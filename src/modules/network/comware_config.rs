//! Comware Configuration Module
//!
//! Pushes a full configuration file to an HPE/H3C Comware 7 switch.
//!
//! Merging a full configuration onto a running switch adds and updates
//! objects but never removes them. In incremental mode (`is_delete: false`)
//! the module therefore compares the new file against the previously pushed
//! configuration and prepends `undo` commands for removed service instances,
//! VPN instances and their static routes, VSIs, VSI interfaces and tunnels.
//! In full replacement mode (`is_delete: true`) the file is pushed as is.
//!
//! # Example Usage
//!
//! ```yaml
//! - name: Push leaf configuration
//!   comware_install_config:
//!     type: config
//!     config_file: build/leaf-1.cfg
//!     previous_config_file: build/leaf-1.cfg.previous
//!     is_delete: false
//!     hostname: leaf-1.dc1
//!     username: admin
//!     password: "{{ vault_password }}"
//! ```

use super::common::{calculate_config_checksum, ComwareDevice, DeviceSession};
use super::config_diff::{self, ConfigText, DiffLine, EditScript};
use super::undo;
use crate::connection::HostConfig;
use crate::modules::{
    Diff, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Command list used when an incremental run finds nothing to change
pub const NO_CHANGES: &str = "# There are no changes";

/// Reported as `end_state`; the module does not read back device state
const END_STATE: &str = "N/A for this module.";

// ============================================================================
// Parameters
// ============================================================================

/// How the command list is sent to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Run as display commands (read-only)
    Display,
    /// Apply as configuration
    Config,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandType::Display => write!(f, "display"),
            CommandType::Config => write!(f, "config"),
        }
    }
}

impl FromStr for CommandType {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "display" | "show" => Ok(CommandType::Display),
            "config" => Ok(CommandType::Config),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid type '{}'. Valid options: display, show, config",
                s
            ))),
        }
    }
}

/// Where the previous configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviousSource {
    /// Literal content, split on `\n`
    Content(String),
    /// A file; a missing file counts as an empty configuration
    File(PathBuf),
    /// Nothing given
    Absent,
}

impl PreviousSource {
    /// Load the previous configuration. Only an unreadable existing file is
    /// an error.
    pub fn load(&self) -> ModuleResult<ConfigText> {
        match self {
            PreviousSource::Content(content) => Ok(ConfigText::from_content(content)),
            PreviousSource::File(path) if path.is_file() => {
                let text = std::fs::read_to_string(path)?;
                Ok(ConfigText::from_file_text(&text))
            }
            PreviousSource::File(path) => {
                warn!(
                    path = %path.display(),
                    "Previous configuration file not found, diffing against an empty configuration"
                );
                Ok(ConfigText::default())
            }
            PreviousSource::Absent => {
                warn!("No previous configuration given, diffing against an empty configuration");
                Ok(ConfigText::default())
            }
        }
    }
}

/// Parsed module parameters
#[derive(Debug, Clone)]
pub struct ComwareConfigParams {
    pub command_type: CommandType,
    pub config_file: PathBuf,
    pub previous: PreviousSource,
    /// `true` pushes the file as is, `false` synthesizes undo commands first
    pub is_delete: bool,
    /// Device connection settings
    pub host: HostConfig,
}

impl ComwareConfigParams {
    /// Parse parameters from module params
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let command_type = CommandType::from_str(&params.get_string_required("type")?)?;
        let config_file = PathBuf::from(params.get_string_required("config_file")?);
        let is_delete = params.get_bool_required("is_delete")?;

        // Empty inline content falls through to the file
        let previous = match (
            params
                .get_string("previous_config_content")?
                .filter(|c| !c.is_empty()),
            params.get_string("previous_config_file")?,
        ) {
            (Some(content), _) => PreviousSource::Content(content),
            (None, Some(path)) => PreviousSource::File(PathBuf::from(path)),
            (None, None) => PreviousSource::Absent,
        };

        let mut host = HostConfig::new();
        host.hostname = params.get_string("hostname")?;
        host.user = params.get_string("username")?;
        host.password = params.get_string("password")?;
        if let Some(port) = params.get_u32("port")? {
            host.port = Some(u16::try_from(port).map_err(|_| {
                ModuleError::InvalidParameter(format!("port {} is out of range", port))
            })?);
        }
        if let Some(timeout) = params.get_u32("timeout")? {
            host.connect_timeout = Some(u64::from(timeout));
        }

        Ok(Self {
            command_type,
            config_file,
            previous,
            is_delete,
            host,
        })
    }
}

// ============================================================================
// Command Plan
// ============================================================================

/// Everything the module intends to send, computed without touching the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Final command list, in send order
    pub commands: Vec<String>,
    /// Synthesized undo commands (a prefix of `commands`)
    pub undo_commands: Vec<String>,
    /// Added and removed lines found by the diff
    pub changed_lines: Vec<DiffLine>,
    /// The diff the plan was built from (empty for full replacement)
    pub edit_script: EditScript,
    noop: bool,
}

impl CommandPlan {
    /// Every line of the configuration file, in file order
    pub fn full_replacement(config_commands: Vec<String>) -> Self {
        Self {
            commands: config_commands,
            undo_commands: Vec::new(),
            changed_lines: Vec::new(),
            edit_script: EditScript::default(),
            noop: false,
        }
    }

    /// Undo commands for removed objects followed by the whole file, or the
    /// no-change placeholder when the configurations are identical
    pub fn incremental(
        previous: &ConfigText,
        current: &ConfigText,
        config_commands: Vec<String>,
    ) -> Self {
        let edit_script = config_diff::diff(previous.lines(), current.lines());
        let synthesis = undo::synthesize(edit_script.body());

        if synthesis.is_noop() {
            return Self {
                commands: vec![NO_CHANGES.to_string()],
                undo_commands: Vec::new(),
                changed_lines: Vec::new(),
                edit_script,
                noop: true,
            };
        }

        let mut commands = synthesis.commands.clone();
        commands.extend(config_commands);
        Self {
            commands,
            undo_commands: synthesis.commands,
            changed_lines: synthesis.changed_lines,
            edit_script,
            noop: false,
        }
    }

    /// True when there is nothing to send
    pub fn is_noop(&self) -> bool {
        self.noop
    }

    /// Changed lines rendered with their markers
    pub fn list_diff(&self) -> Vec<String> {
        self.changed_lines.iter().map(ToString::to_string).collect()
    }

    /// Commands joined the way the device log shows them
    pub fn config_string(&self) -> String {
        self.commands.join(";")
    }

    fn to_diff(&self) -> Diff {
        let removed = self.changed_lines.iter().filter(|l| l.is_removed()).count();
        let before = format!("{} removed lines", removed);
        let after = format!(
            "{} commands ({} undo)",
            self.commands.len(),
            self.undo_commands.len()
        );
        let details = if self.edit_script.is_empty() {
            self.commands.join("\n")
        } else {
            self.edit_script.render()
        };
        Diff::new(before, after).with_details(details)
    }
}

/// Read the configuration file, failing with `InputMissing`
fn read_config_file(path: &Path) -> ModuleResult<String> {
    if !path.is_file() {
        return Err(ModuleError::InputMissing(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    std::fs::read_to_string(path).map_err(|e| {
        ModuleError::InputMissing(format!("cannot read config file {}: {}", path.display(), e))
    })
}

/// Commands from configuration text, trailing whitespace trimmed
fn config_commands(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_string()).collect()
}

// ============================================================================
// Module
// ============================================================================

/// Module pushing a configuration file to a Comware switch
pub struct ComwareConfigModule;

impl ComwareConfigModule {
    /// Build the command plan from the parameters and the config file text
    pub fn plan(params: &ComwareConfigParams, config_text: &str) -> ModuleResult<CommandPlan> {
        let commands = config_commands(config_text);
        if params.is_delete {
            debug!(commands = commands.len(), "Full replacement, skipping diff");
            return Ok(CommandPlan::full_replacement(commands));
        }

        let previous = params.previous.load()?;
        let current = ConfigText::from_file_text(config_text);
        let plan = CommandPlan::incremental(&previous, &current, commands);
        debug!(
            changed = plan.changed_lines.len(),
            undo = plan.undo_commands.len(),
            "Incremental plan built"
        );
        Ok(plan)
    }

    fn device_for(
        params: &ComwareConfigParams,
        context: &ModuleContext,
    ) -> ModuleResult<Arc<dyn DeviceSession>> {
        if let Some(device) = &context.device {
            return Ok(device.clone());
        }
        params
            .host
            .validate()
            .map_err(|e| ModuleError::MissingParameter(e.to_string()))?;
        Ok(Arc::new(ComwareDevice::new(params.host.clone())))
    }

    /// Open the session, send the batch and close the session on every path
    async fn push(
        device: &dyn DeviceSession,
        command_type: CommandType,
        commands: &[String],
    ) -> ModuleResult<String> {
        let outcome = Self::open_and_send(device, command_type, commands).await;
        if let Err(e) = device.close().await {
            warn!(device = %device.identifier(), error = %e, "Error while closing device session");
        }
        outcome
    }

    async fn open_and_send(
        device: &dyn DeviceSession,
        command_type: CommandType,
        commands: &[String],
    ) -> ModuleResult<String> {
        device
            .open()
            .await
            .map_err(|e| ModuleError::DeviceOpen(e.to_string()))?;

        info!(
            device = %device.identifier(),
            %command_type,
            commands = commands.len(),
            "Sending commands"
        );

        let sent = match command_type {
            CommandType::Display => device.cli_display(commands).await,
            CommandType::Config => device.cli_config(commands).await,
        };
        sent.map_err(|e| ModuleError::DeviceExecution(e.to_string()))
    }

    fn build_output(
        output: ModuleOutput,
        params: &ComwareConfigParams,
        plan: &CommandPlan,
        checksum: String,
        response: Option<String>,
        diff_mode: bool,
    ) -> ModuleOutput {
        let mut output = output
            .with_data(
                "proposed",
                serde_json::json!({
                    "type": params.command_type,
                    "command": plan.commands,
                }),
            )
            .with_data("commands", serde_json::json!(plan.commands))
            .with_data("list_diff", serde_json::json!(plan.list_diff()))
            .with_data("undo_commands", serde_json::json!(plan.undo_commands))
            .with_data("config_string", serde_json::json!(plan.config_string()))
            .with_data("end_state", serde_json::json!(END_STATE))
            .with_data("config_checksum", serde_json::json!(checksum));

        if let Some(response) = response {
            output = output.with_data("response", serde_json::json!(response));
        }
        if diff_mode {
            output = output.with_diff(plan.to_diff());
        }
        output
    }
}

impl Module for ComwareConfigModule {
    fn name(&self) -> &'static str {
        "comware_install_config"
    }

    fn description(&self) -> &'static str {
        "Push a configuration file to a Comware switch, undoing removed service instances, VPN instances, VSIs and tunnels"
    }

    fn required_params(&self) -> &[&'static str] {
        &["type", "config_file", "is_delete"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        ComwareConfigParams::from_params(params).map(|_| ())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let params = ComwareConfigParams::from_params(params)?;
        let config_text = read_config_file(&params.config_file)?;
        let checksum = calculate_config_checksum(&config_text);
        let plan = Self::plan(&params, &config_text)?;

        if context.check_mode {
            let msg = format!("Would send {} commands", plan.commands.len());
            return Ok(Self::build_output(
                ModuleOutput::changed(msg),
                &params,
                &plan,
                checksum,
                None,
                context.diff_mode,
            ));
        }

        if plan.is_noop() {
            info!(config_file = %params.config_file.display(), "No configuration changes detected");
            return Ok(Self::build_output(
                ModuleOutput::ok("No configuration changes detected"),
                &params,
                &plan,
                checksum,
                None,
                context.diff_mode,
            ));
        }

        let device = Self::device_for(&params, context)?;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                ModuleError::ExecutionFailed(format!("Failed to create async runtime: {}", e))
            })?;
        let response =
            rt.block_on(Self::push(device.as_ref(), params.command_type, &plan.commands))?;

        let output = match params.command_type {
            CommandType::Config => ModuleOutput::changed(format!(
                "Applied {} commands ({} undo)",
                plan.commands.len(),
                plan.undo_commands.len()
            )),
            CommandType::Display => {
                ModuleOutput::ok(format!("Ran {} display commands", plan.commands.len()))
            }
        };

        Ok(Self::build_output(
            output,
            &params,
            &plan,
            checksum,
            Some(response),
            context.diff_mode,
        ))
    }

    fn diff(&self, params: &ModuleParams, _context: &ModuleContext) -> ModuleResult<Option<Diff>> {
        let params = ComwareConfigParams::from_params(params)?;
        let config_text = read_config_file(&params.config_file)?;
        let plan = Self::plan(&params, &config_text)?;
        Ok(Some(plan.to_diff()))
    }
}
