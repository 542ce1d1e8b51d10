//! # comware-push
//!
//! Pushes full configuration files to HPE/H3C Comware 7 switches.
//!
//! Merging a full configuration onto a running switch only ever adds. When a
//! service instance, VPN instance, VSI or tunnel interface disappears from the
//! new file it stays on the device. comware-push diffs the new file against
//! the previously pushed one and prepends the `undo` commands that remove
//! those objects, then sends the batch over SSH.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     CLI (apply / plan)                   │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │          Module Registry (comware_install_config)        │
//! └──────────────────────────────────────────────────────────┘
//!          │                   │                    │
//!          ▼                   ▼                    ▼
//! ┌────────────────┐  ┌─────────────────┐  ┌─────────────────┐
//! │  Line differ   │─▶│ Undo synthesis  │  │ Device session  │
//! └────────────────┘  └─────────────────┘  └─────────────────┘
//!                                                   │
//!                                                   ▼
//!                                          ┌─────────────────┐
//!                                          │ SSH connection  │
//!                                          └─────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use comware_push::prelude::*;
//!
//! let previous = ["vsi blue", " vxlan 10"];
//! let current = ["vsi red", " vxlan 20"];
//!
//! let script = diff(&previous, &current);
//! let synthesis = synthesize(script.body());
//! assert_eq!(synthesis.commands, vec!["undo vsi blue"]);
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod modules;

pub mod prelude {
    //! Commonly used types in one import.

    pub use crate::config::Config;
    pub use crate::connection::{
        CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions, HostConfig,
    };
    #[cfg(feature = "russh")]
    pub use crate::connection::RusshConnection;
    pub use crate::error::{Error, Result};
    pub use crate::modules::network::{
        diff, synthesize, CommandPlan, CommandType, ComwareConfigModule, ComwareDevice,
        DeviceSession, EditScript, Synthesis, UndoRule,
    };
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult,
    };
}

/// Returns the current version of comware-push.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
