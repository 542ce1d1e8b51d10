//! Output formatting for the comware-push CLI
//!
//! Human mode prints colored sections and status lines; JSON mode prints one
//! object per event so the tool can be scripted.

use colored::Colorize;
use comware_push::modules::{ModuleOutput, ModuleStatus};
use std::time::{Duration, Instant};

/// Push outcome for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// Nothing to send, or only display commands were run
    Ok,
    /// Configuration was (or would be) sent
    Changed,
    /// Device rejected the batch or the module failed
    Failed,
    /// Session could not be opened
    Unreachable,
}

impl PushStatus {
    /// Get the colored string representation
    pub fn colored_string(&self) -> String {
        match self {
            PushStatus::Ok => "ok".green().to_string(),
            PushStatus::Changed => "changed".yellow().to_string(),
            PushStatus::Failed => "failed".red().bold().to_string(),
            PushStatus::Unreachable => "unreachable".red().bold().to_string(),
        }
    }

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PushStatus::Ok => "ok",
            PushStatus::Changed => "changed",
            PushStatus::Failed => "failed",
            PushStatus::Unreachable => "unreachable",
        }
    }
}

impl From<ModuleStatus> for PushStatus {
    fn from(status: ModuleStatus) -> Self {
        match status {
            ModuleStatus::Ok => PushStatus::Ok,
            ModuleStatus::Changed => PushStatus::Changed,
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    use_color: bool,
    json_mode: bool,
    verbosity: u8,
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        Self {
            use_color,
            json_mode,
            verbosity,
            start_time: Instant::now(),
        }
    }

    fn emit_json(value: &serde_json::Value) {
        match serde_json::to_string(value) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("failed to encode output: {}", e),
        }
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print the outcome line for a device
    pub fn push_result(&self, device: &str, status: PushStatus, message: &str) {
        if self.json_mode {
            Self::emit_json(&serde_json::json!({
                "type": "result",
                "device": device,
                "status": status.as_str(),
                "message": message,
            }));
            return;
        }

        if self.use_color {
            println!(
                "{}: [{}] => {}",
                status.colored_string(),
                device.bright_white().bold(),
                message
            );
        } else {
            println!("{}: [{}] => {}", status.as_str(), device, message);
        }
    }

    /// Print the full module output as one JSON document
    pub fn module_output(&self, device: &str, output: &ModuleOutput) {
        if !self.json_mode {
            return;
        }
        Self::emit_json(&serde_json::json!({
            "type": "module_output",
            "device": device,
            "output": output,
        }));
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "DEBUG:".magenta(), message);
        } else {
            println!("DEBUG: {}", message);
        }
    }

    /// Print changed lines, colored by their `+`/`-` marker
    pub fn changed_lines(&self, lines: &[String]) {
        if self.json_mode {
            return;
        }

        if lines.is_empty() {
            println!("  (no changes)");
            return;
        }

        for line in lines {
            if !self.use_color {
                println!("  {}", line);
            } else if line.starts_with('-') {
                println!("  {}", line.red());
            } else if line.starts_with('+') {
                println!("  {}", line.green());
            } else {
                println!("  {}", line.bright_black());
            }
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}:", title.bright_white().bold());
        } else {
            println!("\n{}:", title);
        }

        for item in items {
            if self.use_color {
                println!("  {} {}", "-".bright_black(), item);
            } else {
                println!("  - {}", item);
            }
        }
    }

    /// Print the elapsed time since the formatter was created
    pub fn elapsed(&self) {
        if self.json_mode {
            return;
        }

        let duration_str = format_duration(self.start_time.elapsed());
        if self.use_color {
            println!(
                "\n{} {}",
                "Push took".bright_black(),
                duration_str.bright_white()
            );
        } else {
            println!("\nPush took {}", duration_str);
        }
    }
}

/// Format a duration as a human-readable string
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
