use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

// 192.0.2.0/24 is reserved for documentation, so binding fails and the
// binary exits right after wiring its stores.
const UNBINDABLE: &str = "192.0.2.1:9";

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("dinein"));
    cmd.arg("--db-path")
        .arg("some_db")
        .arg("--listen")
        .arg(UNBINDABLE);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("dinein"));
    cmd.arg("--db-path")
        .arg(&db_path)
        .arg("--listen")
        .arg(UNBINDABLE);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("WARNING").not());
    assert!(db_path.exists());
}
