//! Error types for mount point selection and preparation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::request::{BackendKind, MountRequirement};

/// Errors that can occur when choosing a mount point.
#[derive(Debug, Clone, Error)]
pub enum MountPointError {
    /// No directory for temporary mount points is configured
    #[error("no directory for temporary mount points is configured (set OXCRYPT_MOUNT_POINTS_DIR or mount.mount_points_dir)")]
    ConfigurationAbsent,

    /// Every candidate index is occupied by something we must not touch
    #[error(
        "Failed to find feasible mount point at {}. Giving up after {} attempts.",
        pattern.display(),
        attempts
    )]
    ExhaustedRetries {
        /// The naming pattern that was tried, e.g. `/tmp/mnt/vault_x`
        pattern: PathBuf,
        /// Number of indices tried
        attempts: usize,
    },
}

/// Errors that can occur when preparing a chosen mount point.
#[derive(Debug, Error)]
pub enum PreparationError {
    /// Creating a directory failed
    #[error("I/O error while preparing mount point {}: {source}", path.display())]
    Io {
        /// The directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The mount point has no parent directory to create
    #[error("mount point {} has no parent directory", .0.display())]
    NoParent(PathBuf),

    /// The requirement makes no sense for a chooser that prepares mount points
    #[error("illegal mount point requirement '{0}' for a temporary mount point")]
    InvalidRequirement(MountRequirement),

    /// The requirement is known but not supported yet
    #[error("mount point requirement '{0}' is not implemented")]
    Unimplemented(MountRequirement),
}

/// Why an existing entry at a candidate path was not reclaimed.
///
/// Only used to decide whether to move on to the next candidate index; it
/// never leaves [`choose_mount_point`](crate::MountPointChooser::choose_mount_point).
#[derive(Debug, Error)]
pub enum NotALeftover {
    /// Regular files and links are never touched
    #[error("not a directory")]
    NotADirectory,

    /// The entry resolves, so something may still be mounted there
    #[error("entry is reachable and may be an active mount")]
    Reachable,

    /// The directory has content (live mount or user data)
    #[error("directory is not empty")]
    NotEmpty,

    /// No reclamation rule exists for this combination
    #[error("no leftover rule for backend '{backend}' with requirement '{requirement}'")]
    Unsupported {
        /// Backend of the current request
        backend: BackendKind,
        /// Requirement of the current request
        requirement: MountRequirement,
    },

    /// Inspecting or deleting the entry failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
