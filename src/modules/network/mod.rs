//! Network Device Modules
//!
//! Configuration push for HPE/H3C Comware 7 switches.
//!
//! A full configuration file merged onto a running switch never removes
//! anything. The `comware_install_config` module closes that gap: it diffs
//! the new file against the previously pushed one and prepends `undo`
//! commands for the object families that must be removed explicitly.
//!
//! # Architecture
//!
//! ```text
//! +--------------------------+     +-------------------+
//! | comware_install_config   |---->|  DeviceSession    |
//! +--------------------------+     |  (ComwareDevice)  |
//!     |              |             +-------------------+
//!     v              v                       |
//! +-----------+  +-----------+               v
//! |config_diff|->|   undo    |     +-------------------+
//! +-----------+  +-----------+     |  Connection (SSH) |
//!                                  +-------------------+
//! ```

pub mod common;
pub mod comware_config;
pub mod config_diff;
pub mod undo;

// Re-export main types for convenience
pub use common::{
    calculate_config_checksum, find_cli_error, ComwareCommandGenerator, ComwareDevice,
    ConfigCommandGenerator, DeviceSession,
};
pub use comware_config::{
    CommandPlan, CommandType, ComwareConfigModule, ComwareConfigParams, PreviousSource,
    NO_CHANGES,
};
pub use config_diff::{diff, ChangeKind, ConfigText, DiffLine, EditScript};
pub use undo::{synthesize, Synthesis, UndoRule};
