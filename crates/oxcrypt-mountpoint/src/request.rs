//! Per-attempt request context handed to mount point choosers.
//!
//! A [`MountRequest`] bundles everything a chooser needs to know about one
//! mount attempt: the normalized name of the vault, which kind of volume
//! backend is asking, and what that backend expects to find on disk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mount_name::MountName;

/// What a volume backend expects at its mount point before mounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountRequirement {
    /// Only the parent must exist; the driver creates the mount point itself.
    #[serde(rename = "parent-no-mount-point")]
    ParentMustExistNoMountPoint,

    /// The mount point must already exist as an empty directory.
    #[serde(rename = "empty-directory")]
    EmptyDirectoryRequired,

    /// No mount point is needed at all.
    None,

    /// Parent must exist, the mount point may or may not.
    ///
    /// Reserved. No chooser implements it yet.
    ParentOptionalMountPoint,
}

impl MountRequirement {
    /// Identifier used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            MountRequirement::ParentMustExistNoMountPoint => "parent-no-mount-point",
            MountRequirement::EmptyDirectoryRequired => "empty-directory",
            MountRequirement::None => "none",
            MountRequirement::ParentOptionalMountPoint => "parent-optional-mount-point",
        }
    }

    /// All requirement variants.
    pub fn all() -> &'static [MountRequirement] {
        &[
            MountRequirement::ParentMustExistNoMountPoint,
            MountRequirement::EmptyDirectoryRequired,
            MountRequirement::None,
            MountRequirement::ParentOptionalMountPoint,
        ]
    }
}

impl fmt::Display for MountRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MountRequirement {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("mount requirement", s, Self::all().iter().map(MountRequirement::as_str)))
    }
}

/// Which family of volume implementation is requesting a mount point.
///
/// The family decides how leftovers of earlier runs are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// An OS-level mount driver (Dokany, WinFsp) manages the mount point.
    ///
    /// After an unclean unmount the driver may leave a dangling placeholder
    /// behind.
    #[serde(rename = "driver")]
    DriverBacked,

    /// FUSE-style mounts (macFUSE, libfuse) that attach to an existing
    /// empty directory.
    #[default]
    #[serde(rename = "fuse")]
    UserspaceBacked,

    /// Local WebDAV/NFS servers mounted by the system client.
    #[serde(rename = "network")]
    NetworkBacked,
}

impl BackendKind {
    /// Identifier used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::DriverBacked => "driver",
            BackendKind::UserspaceBacked => "fuse",
            BackendKind::NetworkBacked => "network",
        }
    }

    /// All backend kinds.
    pub fn all() -> &'static [BackendKind] {
        &[
            BackendKind::DriverBacked,
            BackendKind::UserspaceBacked,
            BackendKind::NetworkBacked,
        ]
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("backend kind", s, Self::all().iter().map(BackendKind::as_str)))
    }
}

/// Error returned when parsing an unknown [`BackendKind`] or [`MountRequirement`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    what: &'static str,
    value: String,
    expected: String,
}

impl UnknownVariant {
    fn new<'a>(what: &'static str, value: &str, expected: impl Iterator<Item = &'a str>) -> Self {
        Self {
            what,
            value: value.to_string(),
            expected: expected.collect::<Vec<_>>().join(", "),
        }
    }
}

/// Everything a chooser may query about one mount attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRequest {
    mount_name: MountName,
    backend: BackendKind,
    requirement: MountRequirement,
}

impl MountRequest {
    /// Create a request for the given vault name and backend.
    pub fn new(mount_name: MountName, backend: BackendKind, requirement: MountRequirement) -> Self {
        Self {
            mount_name,
            backend,
            requirement,
        }
    }

    /// Normalized name used as the basename of temporary mount points.
    pub fn mount_name(&self) -> &MountName {
        &self.mount_name
    }

    /// Backend family performing the mount.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// What the backend expects at the mount point.
    pub fn requirement(&self) -> MountRequirement {
        self.requirement
    }
}
