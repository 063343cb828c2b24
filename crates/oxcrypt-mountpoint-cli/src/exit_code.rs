//! Exit codes for the CLI.
//!
//! These follow common Unix conventions and provide meaningful
//! status information for scripting and automation.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments)
#[allow(dead_code)] // clap exits with this code itself
pub const USAGE_ERROR: u8 = 2;

/// No mount points directory configured, or the config file is broken
pub const CONFIG_ERROR: u8 = 3;

/// Permission denied while creating the mount point
pub const PERMISSION_DENIED: u8 = 5;

/// No mount point available, or preparing it failed
pub const MOUNT_POINT_UNAVAILABLE: u8 = 6;
