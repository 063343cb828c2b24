//! End-to-end tests for the temporary mount point chooser.
//!
//! Each test works on its own scratch directory and walks through the
//! choose → prepare → cleanup lifecycle the way a mount backend would.

mod common;

use std::fs;

use common::{capture_logs, request, Scratch};
use oxcrypt_mountpoint::{
    BackendKind, Environment, MountPointChooser, MountPointError, MountRequirement,
    TemporaryMountPointChooser, MAX_RETRIES,
};
use proptest::prelude::*;

#[test]
fn test_full_lifecycle_leaves_scratch_dir_empty() {
    let scratch = Scratch::new();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    assert!(scratch.chooser.is_applicable(&req));
    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("myvault_0"));

    let owned = scratch.chooser.prepare(&req, &mount_point).unwrap();
    assert!(owned);
    assert!(mount_point.is_dir());

    scratch.chooser.cleanup(&req, &mount_point);
    assert!(scratch.entries().is_empty());
}

#[test]
fn test_driver_lifecycle_leaves_mount_point_absent() {
    let scratch = Scratch::new();
    let req = request("myvault", BackendKind::DriverBacked, MountRequirement::ParentMustExistNoMountPoint);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    let owned = scratch.chooser.prepare(&req, &mount_point).unwrap();

    assert!(!owned);
    assert!(fs::symlink_metadata(&mount_point).is_err());
    assert!(scratch.entries().is_empty());
}

#[test]
fn test_picks_lowest_free_index() {
    let scratch = Scratch::new();
    for i in 0..4 {
        scratch.occupy("myvault", i);
    }
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("myvault_4"));
}

#[test]
fn test_gap_in_occupied_indices_is_filled() {
    let scratch = Scratch::new();
    scratch.occupy("myvault", 0);
    scratch.occupy("myvault", 2);
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("myvault_1"));
}

#[test]
fn test_other_vaults_do_not_interfere() {
    let scratch = Scratch::new();
    scratch.occupy("other", 0);
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("myvault_0"));
}

#[test]
fn test_exhaustion_is_logged_with_attempt_count() {
    let scratch = Scratch::new();
    let occupied: Vec<_> = (0..MAX_RETRIES).map(|i| scratch.occupy("myvault", i)).collect();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let (result, logs) = capture_logs(|| scratch.chooser.choose_mount_point(&req));

    assert!(matches!(
        result,
        Err(MountPointError::ExhaustedRetries { attempts: 10, .. })
    ));
    assert!(logs.contains("ERROR"), "logs: {logs}");
    assert!(logs.contains("Giving up after 10 attempts"), "logs: {logs}");
    assert!(logs.contains("myvault_x"), "logs: {logs}");
    for dir in occupied {
        assert!(dir.join("mounted-content.txt").exists());
    }
}

#[test]
fn test_eleventh_index_is_never_used() {
    let scratch = Scratch::new();
    for i in 0..MAX_RETRIES {
        fs::write(scratch.join(&format!("myvault_{i}")), "file").unwrap();
    }
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    assert!(scratch.chooser.choose_mount_point(&req).is_err());
    assert!(!scratch.join("myvault_10").exists());
}

#[test]
fn test_empty_leftover_is_reclaimed_for_parent_only_requirement() {
    let scratch = Scratch::new();
    fs::create_dir(scratch.join("myvault_0")).unwrap();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::ParentMustExistNoMountPoint);

    let (mount_point, logs) = capture_logs(|| scratch.chooser.choose_mount_point(&req).unwrap());

    assert_eq!(mount_point, scratch.join("myvault_0"));
    assert!(!mount_point.exists());
    assert!(logs.contains("Removing empty leftover"), "logs: {logs}");
}

#[test]
fn test_driver_backed_live_directory_is_skipped() {
    let scratch = Scratch::new();
    fs::create_dir(scratch.join("myvault_0")).unwrap();
    let req = request("myvault", BackendKind::DriverBacked, MountRequirement::ParentMustExistNoMountPoint);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("myvault_1"));
    assert!(scratch.join("myvault_0").is_dir());
}

#[cfg(unix)]
#[test]
fn test_dangling_link_counts_as_occupied() {
    let scratch = Scratch::new();
    std::os::unix::fs::symlink(scratch.join("gone"), scratch.join("myvault_0")).unwrap();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::ParentMustExistNoMountPoint);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("myvault_1"));
    assert!(fs::symlink_metadata(scratch.join("myvault_0")).is_ok());
}

#[test]
fn test_normalized_name_is_used_as_basename() {
    let scratch = Scratch::new();
    let req = request("Work: 2024/Q1", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch.join("Work_ 2024_Q1_0"));
}

#[test]
fn test_inapplicable_chooser_warns() {
    let chooser = TemporaryMountPointChooser::new(Environment::default());
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let (applicable, logs) = capture_logs(|| chooser.is_applicable(&req));

    assert!(!applicable);
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("not set to a valid path"), "logs: {logs}");
}

#[test]
fn test_cleanup_of_missing_path_warns_and_returns() {
    let scratch = Scratch::new();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);
    let missing = scratch.join("myvault_0");

    let ((), logs) = capture_logs(|| scratch.chooser.cleanup(&req, &missing));

    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("Could not delete mount point"), "logs: {logs}");
}

#[test]
fn test_cleanup_of_non_empty_mount_point_keeps_content() {
    let scratch = Scratch::new();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);
    let mount_point = scratch.chooser.choose_mount_point(&req).unwrap();
    scratch.chooser.prepare(&req, &mount_point).unwrap();
    fs::write(mount_point.join("still-mounted.txt"), "data").unwrap();

    let ((), logs) = capture_logs(|| scratch.chooser.cleanup(&req, &mount_point));

    assert!(mount_point.join("still-mounted.txt").exists());
    assert!(logs.contains("Could not delete mount point"), "logs: {logs}");
}

#[test]
fn test_scratch_dir_itself_is_never_created() {
    let parent = tempfile::TempDir::new().unwrap();
    let scratch_dir = parent.path().join("not-yet-there");
    let chooser = TemporaryMountPointChooser::new(Environment::with_mount_points_dir(&scratch_dir));
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let mount_point = chooser.choose_mount_point(&req).unwrap();
    assert_eq!(mount_point, scratch_dir.join("myvault_0"));
    assert!(!scratch_dir.exists());
}

#[test]
fn test_sequential_attempts_get_distinct_mount_points() {
    let scratch = Scratch::new();
    let req = request("myvault", BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);

    let first = scratch.chooser.choose_mount_point(&req).unwrap();
    scratch.chooser.prepare(&req, &first).unwrap();
    // Simulate the first vault being mounted
    fs::write(first.join(".mounted"), "").unwrap();

    let second = scratch.chooser.choose_mount_point(&req).unwrap();
    assert_ne!(first, second);
    assert_eq!(second, scratch.join("myvault_1"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_fresh_scratch_dir_yields_index_zero(name in "[a-zA-Z0-9 ._-]{1,24}") {
        let scratch = Scratch::new();
        let req = request(&name, BackendKind::UserspaceBacked, MountRequirement::EmptyDirectoryRequired);
        let expected = scratch.join(&format!("{}_0", req.mount_name()));

        let chosen = scratch.chooser.choose_mount_point(&req).unwrap();
        prop_assert_eq!(chosen, expected);
        prop_assert!(scratch.entries().is_empty());
    }

    #[test]
    fn prop_first_free_index_wins(occupied in 0usize..MAX_RETRIES) {
        let scratch = Scratch::new();
        for i in 0..occupied {
            scratch.occupy("vault", i);
        }
        let req = request("vault", BackendKind::UserspaceBacked, MountRequirement::ParentMustExistNoMountPoint);

        let chosen = scratch.chooser.choose_mount_point(&req).unwrap();
        prop_assert_eq!(chosen, scratch.join(&format!("vault_{occupied}")));
    }
}
