#![deny(unsafe_code)]

mod commands;
mod exit_code;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oxcrypt_mountpoint::{Environment, MountPointError, PreparationError, TemporaryMountPointChooser};

use crate::commands::{choose, cleanup, prepare};

/// Choose, prepare and clean up temporary mount points for Cryptomator vaults
#[derive(Parser)]
#[command(name = "oxcrypt-mountpoint")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Pick a mount point for a FUSE mount and create it
    oxcrypt-mountpoint --mount-points-dir ~/.local/share/oxcrypt/mnt choose --name \"Work Vault\" --prepare

    # Pick a mount point for a driver that creates the mount point itself
    oxcrypt-mountpoint choose --name work --backend driver --requirement parent-no-mount-point

    # Remove a mount point after unmounting
    oxcrypt-mountpoint cleanup ~/.local/share/oxcrypt/mnt/Work Vault_0
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory for temporary mount points (overrides OXCRYPT_MOUNT_POINTS_DIR and config.toml)
    #[arg(long, value_name = "DIR", global = true)]
    mount_points_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose a free mount point for a vault
    Choose(choose::Args),

    /// Prepare a mount point for the given backend
    Prepare(prepare::Args),

    /// Remove a mount point after use (never fails)
    Cleanup(cleanup::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Only print error if not quiet mode (quiet is parsed separately for this)
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");

            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    match cli.command {
        Commands::Choose(args) => {
            let environment = load_environment(cli.mount_points_dir.as_deref())?;
            choose::execute(&TemporaryMountPointChooser::new(environment), &args)
        }
        // Prepare and cleanup work on explicit paths and must not fail on a broken config
        Commands::Prepare(args) => {
            prepare::execute(&TemporaryMountPointChooser::new(Environment::default()), &args)
        }
        Commands::Cleanup(args) => {
            cleanup::execute(&TemporaryMountPointChooser::new(Environment::default()), &args);
            Ok(())
        }
    }
}

/// Command-line flag wins over environment variable and config file
fn load_environment(flag: Option<&Path>) -> Result<Environment> {
    if let Some(dir) = flag {
        return Ok(Environment::with_mount_points_dir(dir));
    }
    Environment::load().context("Failed to load mount point configuration")
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(mount_point_err) = cause.downcast_ref::<MountPointError>() {
            return match mount_point_err {
                MountPointError::ConfigurationAbsent => exit_code::CONFIG_ERROR,
                MountPointError::ExhaustedRetries { .. } => exit_code::MOUNT_POINT_UNAVAILABLE,
            };
        }

        if let Some(prep_err) = cause.downcast_ref::<PreparationError>() {
            if let PreparationError::Io { source, .. } = prep_err
                && source.kind() == io::ErrorKind::PermissionDenied
            {
                return exit_code::PERMISSION_DENIED;
            }
            return exit_code::MOUNT_POINT_UNAVAILABLE;
        }
    }

    // Config loading errors come from toml/io and carry no typed variant
    let msg = format!("{e:#}").to_lowercase();
    if msg.contains("config") {
        exit_code::CONFIG_ERROR
    } else {
        exit_code::GENERAL_ERROR
    }
}
