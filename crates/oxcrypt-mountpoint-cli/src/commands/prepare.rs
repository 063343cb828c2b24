//! Prepare command - bring a mount point into the state a backend expects.
//!
//! Prints `owned` if a directory was created that must be cleaned up later,
//! `not-owned` if only the parent was created (or nothing needed to be done).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use oxcrypt_mountpoint::MountPointChooser;

use super::RequestArgs;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Mount point to prepare
    pub mountpoint: PathBuf,

    #[command(flatten)]
    pub request: RequestArgs,
}

#[instrument(level = "info", name = "cmd::prepare", skip_all, fields(mountpoint = %args.mountpoint.display(), requirement = %args.request.requirement))]
pub fn execute(chooser: &dyn MountPointChooser, args: &Args) -> Result<()> {
    let display_name = args
        .mountpoint
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let request = args.request.to_request(&display_name);

    let owned = chooser
        .prepare(&request, &args.mountpoint)
        .with_context(|| format!("Failed to prepare mount point {}", args.mountpoint.display()))?;

    println!("{}", if owned { "owned" } else { "not-owned" });
    Ok(())
}
