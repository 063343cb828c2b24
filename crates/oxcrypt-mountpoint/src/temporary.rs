//! Temporary mount points below a configured scratch directory.
//!
//! Mount points are named `<mount_points_dir>/<mount name>_<index>` with
//! `index` in `0..MAX_RETRIES`. The lowest index that is either free or
//! occupied only by debris of an earlier run wins.
//!
//! # Leftovers
//!
//! A crashed process or an unclean unmount leaves its mount point behind.
//! What that debris looks like depends on the backend:
//!
//! - mount drivers (Dokany, WinFsp) leave a placeholder directory whose
//!   target no longer resolves
//! - FUSE leaves the empty directory it was mounted on
//!
//! Reclamation is allow-list based. Anything that does not match one of
//! those two shapes exactly is left alone and the next index is tried, so a
//! live mount or user data at a candidate path is never deleted.
//!
//! # Races
//!
//! No cross-process locking is done. Two processes scanning the same
//! directory at the same time may pick the same index; the loser sees its
//! directory creation or mount fail and has to retry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::chooser::MountPointChooser;
use crate::environment::Environment;
use crate::error::{MountPointError, NotALeftover, PreparationError};
use crate::request::{BackendKind, MountRequest, MountRequirement};

/// Number of candidate indices tried before giving up.
pub const MAX_RETRIES: usize = 10;

/// What [`remove_leftovers`] did with a recognized leftover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclaimed {
    /// The leftover entry was deleted
    Removed,
    /// The leftover is an empty directory, which is what preparation needs
    KeptEmptyDirectory,
}

/// Chooses mount points inside the configured mount points directory.
#[derive(Debug, Clone)]
pub struct TemporaryMountPointChooser {
    environment: Environment,
}

impl TemporaryMountPointChooser {
    /// Rank among sibling choosers.
    pub const PRIORITY: i32 = 300;

    /// Create a chooser using the given settings.
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    /// Scan `<parent>/<basename>_0` .. `<parent>/<basename>_9` for a usable path.
    fn choose_in(&self, parent: &Path, request: &MountRequest) -> Result<PathBuf, MountPointError> {
        let basename = request.mount_name().as_str();
        for index in 0..MAX_RETRIES {
            let candidate = parent.join(format!("{basename}_{index}"));
            // Dangling links count as existing
            if matches!(fs::symlink_metadata(&candidate), Err(e) if e.kind() == io::ErrorKind::NotFound) {
                return Ok(candidate);
            }

            match remove_leftovers(&candidate, request.backend(), request.requirement()) {
                Ok(_) => return Ok(candidate),
                Err(reason) => {
                    tracing::debug!(
                        candidate = %candidate.display(),
                        %reason,
                        "Mount point candidate is occupied, trying next index"
                    );
                }
            }
        }

        let pattern = parent.join(format!("{basename}_x"));
        tracing::error!(
            "Failed to find feasible mountpoint at {}. Giving up after {} attempts.",
            pattern.display(),
            MAX_RETRIES
        );
        Err(MountPointError::ExhaustedRetries {
            pattern,
            attempts: MAX_RETRIES,
        })
    }
}

impl MountPointChooser for TemporaryMountPointChooser {
    fn is_applicable(&self, _request: &MountRequest) -> bool {
        if self.environment.mount_points_dir().is_none() {
            tracing::warn!("Mount points directory is not set to a valid path!");
            return false;
        }
        true
    }

    fn choose_mount_point(&self, request: &MountRequest) -> Result<PathBuf, MountPointError> {
        let parent = self
            .environment
            .mount_points_dir()
            .ok_or(MountPointError::ConfigurationAbsent)?;
        self.choose_in(parent, request)
    }

    fn prepare(&self, request: &MountRequest, mount_point: &Path) -> Result<bool, PreparationError> {
        if is_auto_provisioned(mount_point) {
            tracing::debug!(
                "Mount point {} is created on demand by the FUSE driver",
                mount_point.display()
            );
            return Ok(false);
        }

        match request.requirement() {
            MountRequirement::ParentMustExistNoMountPoint => {
                let parent = mount_point
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .ok_or_else(|| PreparationError::NoParent(mount_point.to_path_buf()))?;
                fs::create_dir_all(parent).map_err(|source| PreparationError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
                tracing::debug!("Successfully created folder for mount point: {}", mount_point.display());
                Ok(false)
            }
            MountRequirement::EmptyDirectoryRequired => {
                fs::create_dir_all(mount_point).map_err(|source| PreparationError::Io {
                    path: mount_point.to_path_buf(),
                    source,
                })?;
                tracing::debug!("Successfully created mount point: {}", mount_point.display());
                Ok(true)
            }
            // A chooser that prepares mount points is pointless without one
            requirement @ MountRequirement::None => Err(PreparationError::InvalidRequirement(requirement)),
            requirement @ MountRequirement::ParentOptionalMountPoint => {
                Err(PreparationError::Unimplemented(requirement))
            }
        }
    }

    fn cleanup(&self, _request: &MountRequest, mount_point: &Path) {
        match remove_entry(mount_point) {
            Ok(()) => tracing::debug!("Successfully deleted mount point: {}", mount_point.display()),
            Err(e) => tracing::warn!("Could not delete mount point {}: {}", mount_point.display(), e),
        }
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }
}

/// Reclaim `candidate` if it is debris from an earlier mount attempt.
///
/// # Rules
///
/// 1. Entries that are not directories (checked without following links)
///    are never touched. On Windows, junctions count as directories and
///    only symbolic links are excluded.
/// 2. [`BackendKind::DriverBacked`]: if the entry's attributes can no
///    longer be resolved it is a dangling driver placeholder and is
///    deleted. A resolvable entry may still be mounted.
/// 3. [`BackendKind::UserspaceBacked`]: an empty directory is a leftover.
///    It is deleted for [`MountRequirement::ParentMustExistNoMountPoint`]
///    and kept otherwise. A non-empty directory is never touched.
/// 4. Everything else is denied.
pub fn remove_leftovers(
    candidate: &Path,
    backend: BackendKind,
    requirement: MountRequirement,
) -> Result<Reclaimed, NotALeftover> {
    if !is_directory_no_follow(candidate)? {
        return Err(NotALeftover::NotADirectory);
    }

    match (backend, requirement) {
        (BackendKind::DriverBacked, _) => match fs::metadata(candidate) {
            Ok(_) => Err(NotALeftover::Reachable),
            Err(e) => {
                tracing::info!(
                    "Removing broken mount point placeholder {} ({})",
                    candidate.display(),
                    e
                );
                fs::remove_dir(candidate)?;
                Ok(Reclaimed::Removed)
            }
        },
        (BackendKind::UserspaceBacked, MountRequirement::ParentMustExistNoMountPoint) => {
            ensure_empty(candidate)?;
            tracing::info!("Removing empty leftover mount point {}", candidate.display());
            fs::remove_dir(candidate)?;
            Ok(Reclaimed::Removed)
        }
        (BackendKind::UserspaceBacked, _) => {
            ensure_empty(candidate)?;
            tracing::info!("Reusing empty leftover mount point {}", candidate.display());
            Ok(Reclaimed::KeptEmptyDirectory)
        }
        (backend @ BackendKind::NetworkBacked, requirement) => {
            Err(NotALeftover::Unsupported { backend, requirement })
        }
    }
}

/// Whether the entry at `path` itself is a directory.
///
/// Drivers leave a junction behind when a mount goes away uncleanly. Junctions
/// carry the directory attribute but are reported as links by
/// [`fs::FileType`], so the attributes and reparse tag are read directly.
#[cfg(windows)]
#[allow(unsafe_code)]
fn is_directory_no_follow(path: &Path) -> io::Result<bool> {
    use std::mem::MaybeUninit;
    use std::os::windows::ffi::OsStrExt;

    use windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE;
    use windows_sys::Win32::Storage::FileSystem::{
        FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_REPARSE_POINT, FindClose, FindFirstFileW, WIN32_FIND_DATAW,
    };
    use windows_sys::Win32::System::SystemServices::IO_REPARSE_TAG_SYMLINK;

    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let mut data = MaybeUninit::<WIN32_FIND_DATAW>::uninit();

    // SAFETY: `wide` is NUL-terminated and `data` is valid for writes.
    let handle = unsafe { FindFirstFileW(wide.as_ptr(), data.as_mut_ptr()) };
    if handle == INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `handle` is a live search handle, closed exactly once.
    unsafe { FindClose(handle) };
    // SAFETY: FindFirstFileW succeeded, so `data` is initialized.
    let data = unsafe { data.assume_init() };

    // dwReserved0 holds the reparse tag when the reparse point attribute is set
    let is_symlink =
        data.dwFileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 && data.dwReserved0 == IO_REPARSE_TAG_SYMLINK;
    Ok(data.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0 && !is_symlink)
}

#[cfg(not(windows))]
fn is_directory_no_follow(path: &Path) -> io::Result<bool> {
    Ok(fs::symlink_metadata(path)?.is_dir())
}

fn ensure_empty(dir: &Path) -> Result<(), NotALeftover> {
    match fs::read_dir(dir)?.next() {
        None => Ok(()),
        Some(_) => Err(NotALeftover::NotEmpty),
    }
}

/// Delete the single entry at `path` without recursing.
///
/// Directories must be empty. Links are removed, never their targets.
/// Regular files are refused.
fn remove_entry(path: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_dir() {
        fs::remove_dir(path)
    } else if file_type.is_symlink() {
        remove_link(path, file_type)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to delete a regular file",
        ))
    }
}

/// Directory links and junctions on Windows can only be removed as directories.
#[cfg(windows)]
fn remove_link(path: &Path, file_type: fs::FileType) -> io::Result<()> {
    use std::os::windows::fs::FileTypeExt;

    if file_type.is_symlink_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(not(windows))]
fn remove_link(path: &Path, _file_type: fs::FileType) -> io::Result<()> {
    fs::remove_file(path)
}

/// Whether the FUSE driver creates this mount point itself.
///
/// Since macFUSE 3.5, non-admin users may mount into `/Volumes` and missing
/// mount points there are created automatically. Only direct children of
/// `/Volumes` qualify.
#[cfg(target_os = "macos")]
fn is_auto_provisioned(mount_point: &Path) -> bool {
    mount_point.parent() == Some(Path::new("/Volumes"))
}

#[cfg(not(target_os = "macos"))]
fn is_auto_provisioned(_mount_point: &Path) -> bool {
    false
}
