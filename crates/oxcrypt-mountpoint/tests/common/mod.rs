//! Shared helpers for mount point integration tests.
//!
//! Provides a scratch directory fixture and a way to capture the `tracing`
//! output of a closure, so tests can assert on logged warnings and errors.

// Not all tests use all helpers
#![allow(dead_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use oxcrypt_mountpoint::{
    BackendKind, Environment, MountName, MountRequest, MountRequirement,
    TemporaryMountPointChooser,
};
use tempfile::TempDir;

/// A temporary mount points directory with a chooser configured for it.
pub struct Scratch {
    dir: TempDir,
    pub chooser: TemporaryMountPointChooser,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create scratch dir");
        let chooser = TemporaryMountPointChooser::new(Environment::with_mount_points_dir(dir.path()));
        Self { dir, chooser }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Names of all entries directly inside the scratch directory, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("Failed to list scratch dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Occupy `<name>_<index>` with a non-empty directory (looks like a live mount).
    pub fn occupy(&self, name: &str, index: usize) -> PathBuf {
        let dir = self.join(&format!("{name}_{index}"));
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("mounted-content.txt"), "in use").unwrap();
        dir
    }
}

pub fn request(name: &str, backend: BackendKind, requirement: MountRequirement) -> MountRequest {
    MountRequest::new(MountName::normalize(name), backend, requirement)
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records everything logged at debug level or above.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}
