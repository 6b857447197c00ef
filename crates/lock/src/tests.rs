use super::*;
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::tempdir;

fn open_scratch() -> (tempfile::TempDir, File) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scratch");
    let mut f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    f.write_all(&[0u8; 64]).unwrap();
    (dir, f)
}

// -------------------- Acquire / release --------------------

#[test]
fn exclusive_then_release_then_reacquire() {
    let (_dir, f) = open_scratch();

    let guard = acquire(&f, LockKind::Exclusive, 0, 1).unwrap();
    guard.release().unwrap();

    let again = acquire(&f, LockKind::Exclusive, 0, 1).unwrap();
    again.release().unwrap();
}

#[test]
fn drop_releases_the_region() {
    let (_dir, f) = open_scratch();

    {
        let _guard = acquire(&f, LockKind::Exclusive, 8, 1).unwrap();
    }
    // region is free again after the guard went out of scope
    acquire(&f, LockKind::Exclusive, 8, 1).unwrap().release().unwrap();
}

#[test]
fn shared_locks_coexist() {
    let (_dir, f) = open_scratch();

    let a = acquire(&f, LockKind::Shared, 0, 4).unwrap();
    let b = acquire(&f, LockKind::Shared, 0, 4).unwrap();
    a.release().unwrap();
    b.release().unwrap();
}

#[test]
fn disjoint_regions_are_independent() {
    let (_dir, f) = open_scratch();

    let a = acquire(&f, LockKind::Exclusive, 0, 1).unwrap();
    let b = acquire(&f, LockKind::Exclusive, 1, 1).unwrap();
    a.release().unwrap();
    b.release().unwrap();
}

#[test]
fn zero_len_covers_to_eof() {
    let (_dir, mut f) = open_scratch();

    let guard = acquire(&f, LockKind::Exclusive, 0, 0).unwrap();
    // appending while the to-EOF region is held is fine within one process
    f.write_all(b"tail").unwrap();
    guard.release().unwrap();
}
