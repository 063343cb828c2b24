//! Configuration of the directory that holds temporary mount points.
//!
//! The mount points directory is looked up in this order:
//!
//! 1. `OXCRYPT_MOUNT_POINTS_DIR` environment variable
//! 2. `mount.mount_points_dir` in `config.toml` inside the config directory
//!    (`OXCRYPT_CONFIG_DIR`, or `~/.config/oxcrypt` on Linux and
//!    `~/Library/Application Support/com.oxidized.oxcrypt` on macOS)
//!
//! Empty values count as unset.
//!
//! # Example configuration
//!
//! ```toml
//! [mount]
//! mount_points_dir = "/home/user/.local/share/oxcrypt/mnt"
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the mount points directory.
pub const MOUNT_POINTS_DIR_ENV: &str = "OXCRYPT_MOUNT_POINTS_DIR";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "OXCRYPT_CONFIG_DIR";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings the temporary mount point chooser depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Environment {
    /// Directory under which temporary mount points are created
    #[serde(default)]
    pub mount_points_dir: Option<PathBuf>,
}

/// On-disk layout of `config.toml`. Other sections are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mount: Environment,
}

impl Environment {
    /// Environment with an explicit mount points directory.
    pub fn with_mount_points_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            mount_points_dir: Some(dir.into()),
        }
    }

    /// Load settings from the process environment and the config file.
    ///
    /// A missing config file is not an error.
    pub fn load() -> Result<Self> {
        let from_env = non_empty_path(std::env::var_os(MOUNT_POINTS_DIR_ENV));
        let from_file = match config_path() {
            Some(path) => Self::load_file(&path)?,
            None => {
                tracing::debug!("Could not determine config directory, skipping config file");
                Self::default()
            }
        };
        Ok(Self::resolve(from_env, from_file))
    }

    /// Load settings from a specific config file.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse settings from the contents of a `config.toml`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut env = file.mount;
        env.mount_points_dir = env.mount_points_dir.filter(|p| !p.as_os_str().is_empty());
        Ok(env)
    }

    /// The configured mount points directory, if any.
    pub fn mount_points_dir(&self) -> Option<&Path> {
        self.mount_points_dir.as_deref()
    }

    /// Environment variable wins over the config file.
    fn resolve(from_env: Option<PathBuf>, from_file: Self) -> Self {
        match from_env {
            Some(dir) => Self::with_mount_points_dir(dir),
            None => from_file,
        }
    }
}

fn non_empty_path(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Get the configuration directory.
///
/// Uses `OXCRYPT_CONFIG_DIR` if set, otherwise the XDG config directory on
/// Linux and Application Support on macOS.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty_path(std::env::var_os(CONFIG_DIR_ENV)) {
        return Some(dir);
    }

    let base_dirs = directories::BaseDirs::new()?;

    #[cfg(target_os = "macos")]
    {
        Some(
            base_dirs
                .home_dir()
                .join("Library/Application Support/com.oxidized.oxcrypt"),
        )
    }

    #[cfg(not(target_os = "macos"))]
    {
        Some(base_dirs.config_dir().join("oxcrypt"))
    }
}

/// Get the path to the configuration file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
