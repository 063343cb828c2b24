//! Mount point chooser abstraction
//!
//! Mounting a vault needs a directory to attach the decrypted view to. Where
//! that directory comes from depends on the user's settings and the
//! platform: a path the user picked, a platform default, or a fresh
//! temporary directory. Each source is a [`MountPointChooser`].
//!
//! # Lifecycle
//!
//! For one mount attempt the caller:
//!
//! 1. asks [`is_applicable()`](MountPointChooser::is_applicable) and skips
//!    the chooser if it returns `false`
//! 2. calls [`choose_mount_point()`](MountPointChooser::choose_mount_point)
//! 3. calls [`prepare()`](MountPointChooser::prepare) on the chosen path
//! 4. mounts the volume (outside of this crate)
//! 5. calls [`cleanup()`](MountPointChooser::cleanup) after unmounting, or
//!    after a failed or timed-out mount, since preparation may already have
//!    created a directory
//!
//! # Example
//!
//! ```no_run
//! use oxcrypt_mountpoint::{
//!     BackendKind, Environment, MountName, MountPointChooser, MountRequest,
//!     MountRequirement, TemporaryMountPointChooser,
//! };
//!
//! let chooser = TemporaryMountPointChooser::new(Environment::load()?);
//! let request = MountRequest::new(
//!     MountName::normalize("Work Vault"),
//!     BackendKind::UserspaceBacked,
//!     MountRequirement::EmptyDirectoryRequired,
//! );
//!
//! if chooser.is_applicable(&request) {
//!     let mount_point = chooser.choose_mount_point(&request)?;
//!     let prepared = chooser.prepare(&request, &mount_point);
//!     if prepared.is_ok() {
//!         // ... mount, use, unmount ...
//!     }
//!     // Runs after every attempt, including failed preparation
//!     chooser.cleanup(&request, &mount_point);
//!     prepared?;
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::{Path, PathBuf};

use crate::error::{MountPointError, PreparationError};
use crate::request::MountRequest;

/// A strategy for picking and preparing the directory a vault is mounted at.
///
/// Choosers hold no per-attempt state, so one instance may serve many
/// concurrent attempts.
pub trait MountPointChooser: Send + Sync {
    /// Whether this chooser can serve the request at all.
    ///
    /// Must not touch the filesystem.
    fn is_applicable(&self, request: &MountRequest) -> bool;

    /// Pick a mount point for the request.
    ///
    /// # Errors
    ///
    /// - [`MountPointError::ConfigurationAbsent`] - the chooser is not configured
    /// - [`MountPointError::ExhaustedRetries`] - no usable path was found
    fn choose_mount_point(&self, request: &MountRequest) -> Result<PathBuf, MountPointError>;

    /// Bring the filesystem at `mount_point` into the state the backend expects.
    ///
    /// Returns `true` if a directory was created that the caller must
    /// remove via [`cleanup()`](MountPointChooser::cleanup) afterwards.
    fn prepare(&self, request: &MountRequest, mount_point: &Path) -> Result<bool, PreparationError>;

    /// Best-effort removal of a mount point after use. Never fails.
    fn cleanup(&self, request: &MountRequest, mount_point: &Path);

    /// Rank of this chooser among its siblings; higher runs first.
    fn priority(&self) -> i32;
}
