//! Choose command - pick a free temporary mount point for a vault.
//!
//! # Examples
//!
//! ```bash
//! # Print the path only
//! oxcrypt-mountpoint choose --name "Work Vault"
//!
//! # Create it as well and report as JSON
//! oxcrypt-mountpoint choose --name "Work Vault" --prepare --json
//! ```

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::instrument;

use oxcrypt_mountpoint::{MountPointChooser, MountPointError};

use super::RequestArgs;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Vault display name (normalized before use)
    #[arg(short, long)]
    pub name: String,

    #[command(flatten)]
    pub request: RequestArgs,

    /// Also prepare the chosen mount point
    #[arg(long)]
    pub prepare: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output format for choose command
#[derive(Serialize)]
struct ChooseOutput {
    mount_point: String,
    prepared: bool,
    owned: bool,
}

#[instrument(level = "info", name = "cmd::choose", skip_all, fields(name = %args.name, backend = %args.request.backend))]
pub fn execute(chooser: &dyn MountPointChooser, args: &Args) -> Result<()> {
    let request = args.request.to_request(&args.name);

    if !chooser.is_applicable(&request) {
        return Err(MountPointError::ConfigurationAbsent.into());
    }

    let mount_point = chooser
        .choose_mount_point(&request)
        .with_context(|| format!("Failed to choose a mount point for '{}'", request.mount_name()))?;

    let owned = if args.prepare {
        chooser
            .prepare(&request, &mount_point)
            .with_context(|| format!("Failed to prepare mount point {}", mount_point.display()))?
    } else {
        false
    };

    if args.json {
        let output = ChooseOutput {
            mount_point: mount_point.display().to_string(),
            prepared: args.prepare,
            owned,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", mount_point.display());
    }

    Ok(())
}
