//! Unit tests for the Commit Protocol.
//!
//! Failure injection goes through a `FileOps` wrapper so each step can be
//! broken on purpose without touching real permissions.

#[path = "../common/mod.rs"]
mod common;

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::Path;

use common::*;
use marksmith::managers::staging_store::{StagingState, StagingStore};
use marksmith::services::commit_protocol::{backup_path_for, CommitProtocol, FileOps, StdFileOps};
use marksmith::services::liveness_guard::FixedGuard;
use marksmith::types::bookmark::NodeId;
use marksmith::types::errors::CommitError;
use rusqlite::Connection;

/// Real file operations with switchable failures.
#[derive(Default)]
struct FlakyOps {
    /// 1-based index of the `copy` call that fails.
    fail_copy_call: Option<usize>,
    /// 1-based indices of the `replace` calls that write junk over the
    /// destination and then fail.
    fail_replace_calls: Vec<usize>,
    fail_backup_removal: bool,
    copies: Cell<usize>,
    replaces: Cell<usize>,
}

impl FileOps for FlakyOps {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let call = self.copies.get() + 1;
        self.copies.set(call);
        if self.fail_copy_call == Some(call) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected copy failure"));
        }
        StdFileOps.copy(from, to)
    }

    fn replace(&self, from: &Path, to: &Path) -> io::Result<(String, u64)> {
        let call = self.replaces.get() + 1;
        self.replaces.set(call);
        if self.fail_replace_calls.contains(&call) {
            fs::write(to, b"half-written")?;
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected replace failure (call {})", call),
            ));
        }
        StdFileOps.replace(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if self.fail_backup_removal && path.to_string_lossy().ends_with(".backup") {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected removal failure"));
        }
        StdFileOps.remove(path)
    }
}

fn dirty_store(fx: &Fixture) -> StagingStore {
    let mut store = StagingStore::create(&fx.path).unwrap();
    store.update_title(NodeId(DOCS), "Committed docs").unwrap();
    store
}

fn title_in(path: &Path, id: i64) -> String {
    let conn = Connection::open(path).unwrap();
    bookmark_row(&conn, id).unwrap().2
}

// ─── Success path ───

#[test]
fn test_commit_replaces_original_atomically() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    let staging = store.staging_path().to_path_buf();

    let report = store.commit(&FixedGuard::idle()).unwrap();

    assert_eq!(report.digest, fx.digest());
    assert_eq!(report.bytes, fx.bytes().len() as u64);
    assert!(report.warnings.is_empty());
    assert_eq!(store.state(), StagingState::Committed);
    assert_eq!(title_in(&fx.path, DOCS), "Committed docs");
    assert!(!staging.exists());
}

#[test]
fn test_commit_removes_backup() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);

    store.commit(&FixedGuard::idle()).unwrap();

    assert!(!fx.backup_path().exists());
    assert_eq!(backup_path_for(&fx.path), fx.backup_path());
}

#[test]
fn test_commit_leaves_no_stray_files_next_to_original() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    store.commit(&FixedGuard::idle()).unwrap();

    let names: Vec<String> = fs::read_dir(fx.dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["places.sqlite".to_string()]);
}

#[test]
fn test_commit_releases_source_for_a_new_store() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    store.commit(&FixedGuard::idle()).unwrap();

    let again = StagingStore::create(&fx.path).unwrap();
    assert_eq!(
        again.load_tree().unwrap().get(NodeId(DOCS)).unwrap().title,
        "Committed docs"
    );
}

#[test]
fn test_commit_twice_is_closed() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    store.commit(&FixedGuard::idle()).unwrap();

    let err = store.commit(&FixedGuard::idle()).unwrap_err();
    assert!(matches!(err, CommitError::Closed(_)));
}

#[test]
fn test_commit_after_rollback_is_closed() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    store.rollback().unwrap();
    assert!(matches!(store.commit(&FixedGuard::idle()), Err(CommitError::Closed(_))));
}

// ─── Guarded commit ───

#[test]
fn test_running_browser_blocks_commit() {
    let fx = places_fixture();
    let before = fx.bytes();
    let mut store = dirty_store(&fx);

    let err = store.commit(&FixedGuard::running("Firefox")).unwrap_err();

    match &err {
        CommitError::SourceLocked(name) => assert_eq!(name, "Firefox"),
        other => panic!("expected SourceLocked, got {:?}", other),
    }
    assert!(err.is_recoverable());
    assert!(err.to_string().contains("Firefox is still running"));
    assert_eq!(fx.bytes(), before);
    assert!(!fx.backup_path().exists());
}

#[test]
fn test_store_stays_usable_after_source_locked() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    store.commit(&FixedGuard::running("LibreWolf")).unwrap_err();

    assert_eq!(store.state(), StagingState::Dirty);
    store.update_title(NodeId(CRATES), "crates.io").unwrap();
    store.commit(&FixedGuard::idle()).unwrap();

    assert_eq!(title_in(&fx.path, DOCS), "Committed docs");
    assert_eq!(title_in(&fx.path, CRATES), "crates.io");
}

// ─── Backup failure ───

#[test]
fn test_backup_failure_aborts_before_swap() {
    let fx = places_fixture();
    let before = fx.bytes();
    let mut store = dirty_store(&fx);
    let ops = FlakyOps {
        fail_copy_call: Some(1),
        ..Default::default()
    };
    let guard = FixedGuard::idle();

    let err = CommitProtocol::with_file_ops(&guard, &ops)
        .commit(&mut store)
        .unwrap_err();

    assert!(matches!(err, CommitError::BackupFailed(_)), "got {:?}", err);
    assert!(err.is_recoverable());
    assert_eq!(fx.bytes(), before);
    assert!(!fx.backup_path().exists());
    assert_eq!(store.state(), StagingState::Dirty);
    assert_eq!(
        store.load_tree().unwrap().get(NodeId(DOCS)).unwrap().title,
        "Committed docs"
    );
}

// ─── Swap failure ───

#[test]
fn test_swap_failure_restores_original() {
    let fx = places_fixture();
    let before = fx.bytes();
    let mut store = dirty_store(&fx);
    let ops = FlakyOps {
        fail_replace_calls: vec![1],
        ..Default::default()
    };
    let guard = FixedGuard::idle();

    let err = CommitProtocol::with_file_ops(&guard, &ops)
        .commit(&mut store)
        .unwrap_err();

    assert!(matches!(err, CommitError::SwapFailed(_)), "got {:?}", err);
    assert!(err.is_recoverable());
    assert_eq!(fx.bytes(), before);
    assert!(!fx.backup_path().exists());
    // One copy for the backup; the restore is an atomic replace, not a
    // truncating copy over the original.
    assert_eq!(ops.copies.get(), 1);
    assert_eq!(ops.replaces.get(), 2);

    // The staged edit survives and a later commit goes through.
    assert_eq!(store.state(), StagingState::Dirty);
    store.commit(&guard).unwrap();
    assert_eq!(title_in(&fx.path, DOCS), "Committed docs");
}

#[test]
fn test_failed_restore_is_unrecoverable_and_keeps_files() {
    let fx = places_fixture();
    let before = fx.bytes();
    let mut store = dirty_store(&fx);
    let staging = store.staging_path().to_path_buf();
    let ops = FlakyOps {
        fail_replace_calls: vec![1, 2],
        ..Default::default()
    };
    let guard = FixedGuard::idle();

    let err = CommitProtocol::with_file_ops(&guard, &ops)
        .commit(&mut store)
        .unwrap_err();

    match &err {
        CommitError::Unrecoverable { backup, staging: kept, swap, restore } => {
            assert_eq!(backup, &fx.backup_path());
            assert_eq!(kept, &staging);
            assert!(swap.contains("call 1"));
            assert!(restore.contains("call 2"));
        }
        other => panic!("expected Unrecoverable, got {:?}", other),
    }
    assert!(!err.is_recoverable());
    assert_eq!(fs::read(fx.backup_path()).unwrap(), before);
    assert!(staging.exists());
    assert_eq!(store.state(), StagingState::Closed);
    assert!(matches!(store.commit(&guard), Err(CommitError::Closed(_))));

    // Clean up the staging copy this test deliberately kept.
    let _ = fs::remove_file(&staging);
}

#[test]
fn test_unrecoverable_message_names_both_files() {
    let err = CommitError::Unrecoverable {
        swap: "rename failed".to_string(),
        restore: "disk full".to_string(),
        backup: "/p/places.sqlite.backup".into(),
        staging: "/tmp/stage.sqlite".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("/p/places.sqlite.backup"));
    assert!(msg.contains("/tmp/stage.sqlite"));
    assert!(msg.contains("disk full"));
}

// ─── Source write-ahead log ───

const CRASH_EDIT: &str = "UPDATE moz_bookmarks SET title = 'from-crash-wal' WHERE id = 9";

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_commit_over_leftover_wal_keeps_staged_edit() {
    let fx = places_fixture();
    leave_uncheckpointed_wal(&fx, CRASH_EDIT);
    let mut store = StagingStore::create(&fx.path).unwrap();
    store.update_title(NodeId(RUST), "committed-title").unwrap();

    let report = store.commit(&FixedGuard::idle()).unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.digest, fx.digest());
    // The old log is gone, so nothing is replayed over the new file.
    assert_eq!(names_in(fx.dir.path()), vec!["places.sqlite".to_string()]);
    assert_eq!(live_title(&fx.path, RUST), "committed-title");
    assert_eq!(live_title(&fx.path, DOCS), "from-crash-wal");
}

#[test]
fn test_wal_written_after_staging_refuses_commit() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    leave_uncheckpointed_wal(&fx, CRASH_EDIT);
    let main_before = fx.digest();
    let wal_before = file_digest(&fx.wal_path());

    let err = store.commit(&FixedGuard::idle()).unwrap_err();

    assert!(matches!(err, CommitError::SourceChanged(_)), "got {:?}", err);
    assert!(err.is_recoverable());
    assert_eq!(fx.digest(), main_before);
    assert_eq!(file_digest(&fx.wal_path()), wal_before);
    assert!(!fx.backup_path().exists());
    assert_eq!(store.state(), StagingState::Dirty);
}

#[test]
fn test_swap_failure_restores_original_and_its_wal() {
    let fx = places_fixture();
    leave_uncheckpointed_wal(&fx, CRASH_EDIT);
    let main_before = fx.bytes();
    let wal_before = fs::read(fx.wal_path()).unwrap();
    let mut store = dirty_store(&fx);
    let ops = FlakyOps {
        fail_replace_calls: vec![1],
        ..Default::default()
    };
    let guard = FixedGuard::idle();

    let err = CommitProtocol::with_file_ops(&guard, &ops)
        .commit(&mut store)
        .unwrap_err();

    assert!(matches!(err, CommitError::SwapFailed(_)), "got {:?}", err);
    assert_eq!(fx.bytes(), main_before);
    assert_eq!(fs::read(fx.wal_path()).unwrap(), wal_before);
    assert_eq!(ops.replaces.get(), 3);
    assert_eq!(names_in(fx.dir.path()), vec!["places.sqlite", "places.sqlite-wal"]);

    store.commit(&guard).unwrap();
    assert_eq!(live_title(&fx.path, DOCS), "Committed docs");
}

#[test]
fn test_wal_backup_failure_leaves_source_alone() {
    let fx = places_fixture();
    leave_uncheckpointed_wal(&fx, CRASH_EDIT);
    let wal_before = fs::read(fx.wal_path()).unwrap();
    let mut store = dirty_store(&fx);
    let ops = FlakyOps {
        fail_copy_call: Some(2),
        ..Default::default()
    };
    let guard = FixedGuard::idle();

    let err = CommitProtocol::with_file_ops(&guard, &ops)
        .commit(&mut store)
        .unwrap_err();

    assert!(matches!(err, CommitError::BackupFailed(_)), "got {:?}", err);
    assert_eq!(fs::read(fx.wal_path()).unwrap(), wal_before);
    assert_eq!(names_in(fx.dir.path()), vec!["places.sqlite", "places.sqlite-wal"]);
    assert_eq!(store.state(), StagingState::Dirty);
}

// ─── Cleanup ───

#[test]
fn test_leftover_backup_is_a_warning_not_an_error() {
    let fx = places_fixture();
    let mut store = dirty_store(&fx);
    let ops = FlakyOps {
        fail_backup_removal: true,
        ..Default::default()
    };
    let guard = FixedGuard::idle();

    let report = CommitProtocol::with_file_ops(&guard, &ops)
        .commit(&mut store)
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("backup"));
    assert!(fx.backup_path().exists());
    assert_eq!(store.state(), StagingState::Committed);
    assert_eq!(report.digest, fx.digest());
}
