//! Temporary mount points for Cryptomator vault mounts.
//!
//! Mount backends need a directory to attach a decrypted vault to. This
//! crate picks such a directory below a configured scratch directory,
//! prepares it for the requesting backend, and removes it again after use.
//!
//! # Components
//!
//! - [`MountPointChooser`] - Trait for mount point strategies
//! - [`TemporaryMountPointChooser`] - Picks `<mount_points_dir>/<name>_<n>`
//! - [`MountRequest`] - Per-attempt context (vault name, backend, requirement)
//! - [`MountName`] - Filesystem-safe vault name
//! - [`Environment`] - Where the mount points directory is configured
//!
//! # Why temporary mount points?
//!
//! Users rarely care where a vault is mounted as long as it shows up in the
//! file manager. Handing out fresh directories below one scratch directory
//! keeps mounts out of the user's home and makes debris of crashed runs easy
//! to recognize: it can only ever be an entry named `<name>_<n>` in that
//! directory. See [`remove_leftovers`] for the exact rules.
//!
//! # Example
//!
//! ```
//! use oxcrypt_mountpoint::{
//!     BackendKind, Environment, MountName, MountPointChooser, MountRequest,
//!     MountRequirement, TemporaryMountPointChooser,
//! };
//!
//! let scratch = tempfile::tempdir()?;
//! let chooser = TemporaryMountPointChooser::new(Environment::with_mount_points_dir(scratch.path()));
//! let request = MountRequest::new(
//!     MountName::normalize("myvault"),
//!     BackendKind::UserspaceBacked,
//!     MountRequirement::EmptyDirectoryRequired,
//! );
//!
//! let mount_point = chooser.choose_mount_point(&request)?;
//! assert_eq!(mount_point, scratch.path().join("myvault_0"));
//!
//! assert!(chooser.prepare(&request, &mount_point)?);
//! chooser.cleanup(&request, &mount_point);
//! assert!(!mount_point.exists());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod chooser;
pub mod environment;
mod error;
mod mount_name;
mod request;
mod temporary;

pub use chooser::MountPointChooser;
pub use environment::Environment;
pub use error::{MountPointError, NotALeftover, PreparationError};
pub use mount_name::MountName;
pub use request::{BackendKind, MountRequest, MountRequirement, UnknownVariant};
pub use temporary::{remove_leftovers, Reclaimed, TemporaryMountPointChooser, MAX_RETRIES};
