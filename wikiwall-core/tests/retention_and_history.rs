//! Filesystem and database tests for the retention cleaner and download history.
//!
//! These run against real temporary directories and SQLite files.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;
use wikiwall_core::{RetentionCleaner, SeenStore, WikiwallError};

/// Create `count` jpg files named `1.jpg..=count.jpg`, each a minute newer than the last.
fn create_downloads(dir: &Path, count: u64) -> Vec<PathBuf> {
    (1..=count)
        .map(|n| {
            let path = dir.join(format!("{n}.jpg"));
            fs::write(&path, b"faux jpeg file").unwrap();
            set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000 + (n as i64) * 60, 0))
                .unwrap();
            path
        })
        .collect()
}

fn remaining(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort_by_key(|name| {
        name.trim_end_matches(".jpg")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

// ============================================================================
// Retention Cleaner
// ============================================================================

#[test]
fn test_ten_downloads_limit_five_keeps_newest() {
    let temp = TempDir::new().unwrap();
    create_downloads(temp.path(), 10);

    let removed = RetentionCleaner::new(temp.path()).enforce_limit(5i64).unwrap();

    assert_eq!(removed, 5);
    assert_eq!(remaining(temp.path()), vec!["6.jpg", "7.jpg", "8.jpg", "9.jpg", "10.jpg"]);
}

#[test]
fn test_no_removal_when_under_limit() {
    let temp = TempDir::new().unwrap();
    create_downloads(temp.path(), 5);

    let removed = RetentionCleaner::new(temp.path()).enforce_limit(10i64).unwrap();

    assert_eq!(removed, 0);
    assert_eq!(remaining(temp.path()).len(), 5);
}

#[test]
fn test_exactly_at_limit_is_untouched() {
    let temp = TempDir::new().unwrap();
    create_downloads(temp.path(), 4);

    assert_eq!(RetentionCleaner::new(temp.path()).enforce_limit(4usize).unwrap(), 0);
    assert_eq!(remaining(temp.path()).len(), 4);
}

#[test]
fn test_cleaning_is_idempotent() {
    let temp = TempDir::new().unwrap();
    create_downloads(temp.path(), 7);
    let cleaner = RetentionCleaner::new(temp.path());

    assert_eq!(cleaner.enforce_limit(3i64).unwrap(), 4);
    assert_eq!(cleaner.enforce_limit(3i64).unwrap(), 0);
    assert_eq!(remaining(temp.path()), vec!["5.jpg", "6.jpg", "7.jpg"]);
}

#[test]
fn test_invalid_limits_remove_nothing() {
    let temp = TempDir::new().unwrap();
    create_downloads(temp.path(), 6);
    let cleaner = RetentionCleaner::new(temp.path());

    assert!(matches!(
        cleaner.enforce_limit(4.5f64),
        Err(WikiwallError::InvalidArgument(_))
    ));
    assert!(matches!(
        cleaner.enforce_limit(-1i64),
        Err(WikiwallError::InvalidArgument(_))
    ));
    assert_eq!(remaining(temp.path()).len(), 6);
}

#[test]
fn test_other_files_survive_zero_limit() {
    let temp = TempDir::new().unwrap();
    create_downloads(temp.path(), 3);
    fs::write(temp.path().join("wikiwall.db"), b"db").unwrap();
    fs::write(temp.path().join("next.jpg.part"), b"partial").unwrap();
    fs::create_dir(temp.path().join("folder.jpg")).unwrap();

    let removed = RetentionCleaner::new(temp.path()).enforce_limit(0i64).unwrap();

    assert_eq!(removed, 3);
    let mut left = remaining(temp.path());
    left.sort();
    assert_eq!(left, vec!["folder.jpg", "next.jpg.part", "wikiwall.db"]);
}

#[test]
fn test_missing_directory_is_io_error() {
    let temp = TempDir::new().unwrap();
    let cleaner = RetentionCleaner::new(temp.path().join("missing"));
    assert!(matches!(cleaner.enforce_limit(1i64), Err(WikiwallError::Io(_))));
}

// ============================================================================
// Download history
// ============================================================================

#[test]
fn test_fresh_store_add_contains_duplicate() {
    let temp = TempDir::new().unwrap();
    let store = SeenStore::open(temp.path().join("wikiwall.db")).unwrap();

    store.add("http://x/a.jpg").unwrap();
    assert!(store.contains("http://x/a.jpg").unwrap());
    assert!(matches!(
        store.add("http://x/a.jpg"),
        Err(WikiwallError::Duplicate(_))
    ));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_history_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("nested").join("wikiwall.db");

    {
        let store = SeenStore::open(&db).unwrap();
        store.add("http://x/a.jpg").unwrap();
    }

    let reopened = SeenStore::open(&db).unwrap();
    assert!(reopened.contains("http://x/a.jpg").unwrap());
    assert!(!reopened.contains("http://x/b.jpg").unwrap());
    reopened.close().unwrap();

    // Opening an existing store again is harmless.
    let again = SeenStore::open(&db).unwrap();
    assert_eq!(again.len().unwrap(), 1);
}

#[test]
fn test_open_fails_on_unwritable_location() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("file");
    fs::write(&blocker, b"not a directory").unwrap();

    assert!(SeenStore::open(blocker.join("wikiwall.db")).is_err());
}
