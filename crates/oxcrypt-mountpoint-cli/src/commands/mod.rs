pub mod choose;
pub mod cleanup;
pub mod prepare;

use clap::Args as ClapArgs;
use oxcrypt_mountpoint::{BackendKind, MountName, MountRequest, MountRequirement};

/// Backend options shared by commands that build a mount request
#[derive(ClapArgs, Clone, Debug)]
pub struct RequestArgs {
    /// Backend family that will mount the vault (driver, fuse, network)
    #[arg(long, default_value_t = BackendKind::UserspaceBacked)]
    pub backend: BackendKind,

    /// What the backend expects at the mount point
    /// (parent-no-mount-point, empty-directory, none, parent-optional-mount-point)
    #[arg(long, default_value_t = MountRequirement::EmptyDirectoryRequired)]
    pub requirement: MountRequirement,
}

impl RequestArgs {
    /// Build the mount request for a vault display name
    pub fn to_request(&self, display_name: &str) -> MountRequest {
        MountRequest::new(MountName::normalize(display_name), self.backend, self.requirement)
    }
}
