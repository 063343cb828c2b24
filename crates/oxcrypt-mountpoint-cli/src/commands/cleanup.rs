//! Cleanup command - remove a mount point after the vault was unmounted.
//!
//! Failures are logged as warnings and never change the exit code, so this
//! is safe to call from unmount scripts unconditionally.

use std::fs;
use std::path::PathBuf;

use clap::Args as ClapArgs;
use tracing::instrument;

use oxcrypt_mountpoint::{BackendKind, MountName, MountPointChooser, MountRequest, MountRequirement};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Mount point to remove
    pub mountpoint: PathBuf,
}

#[instrument(level = "info", name = "cmd::cleanup", skip_all, fields(mountpoint = %args.mountpoint.display()))]
pub fn execute(chooser: &dyn MountPointChooser, args: &Args) {
    // Cleanup does not depend on backend or requirement
    let display_name = args.mountpoint.file_name().unwrap_or_default().to_string_lossy();
    let request = MountRequest::new(
        MountName::normalize(&display_name),
        BackendKind::default(),
        MountRequirement::EmptyDirectoryRequired,
    );

    chooser.cleanup(&request, &args.mountpoint);

    if fs::symlink_metadata(&args.mountpoint).is_ok() {
        eprintln!("Mount point still present: {}", args.mountpoint.display());
    }
}
