use super::helpers::{new_store, reopen, upsert};
use crate::*;

#[test]
fn fetch_missing_returns_none() {
    let (_dir, mut db) = new_store();
    assert!(db.fetch(b"nothing").unwrap().is_none());
    assert_eq!(db.stats().fetch_err, 1);
}

#[test]
fn fetch_returns_an_owned_copy() {
    let (_dir, mut db) = new_store();
    upsert(&mut db, b"k", b"value");
    let first = db.fetch(b"k").unwrap().unwrap();
    let second = db.fetch(b"k").unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, b"value");
}

#[test]
fn fetch_distinguishes_similar_keys() {
    let (_dir, mut db) = new_store();
    upsert(&mut db, b"key", b"1");
    upsert(&mut db, b"key2", b"2");
    assert_eq!(db.fetch(b"key").unwrap().unwrap(), b"1");
    assert_eq!(db.fetch(b"key2").unwrap().unwrap(), b"2");
    assert!(db.fetch(b"ke").unwrap().is_none());
}

#[test]
fn fetch_sees_writes_from_another_handle() {
    let (dir, mut writer) = new_store();
    let mut reader = reopen(&dir);

    upsert(&mut writer, b"shared", b"payload");
    assert_eq!(reader.fetch(b"shared").unwrap().unwrap(), b"payload");

    writer.delete(b"shared").unwrap();
    assert!(reader.fetch(b"shared").unwrap().is_none());
}

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("db");
    {
        let mut db = Store::create(&base).unwrap();
        upsert(&mut db, b"persisted", b"yes");
        db.close();
    }
    let mut db = Store::open(&base, OpenFlags::read_only(), StoreConfig::default()).unwrap();
    assert_eq!(db.fetch(b"persisted").unwrap().unwrap(), b"yes");
}

#[test]
fn hash_is_deterministic() {
    let (dir, db) = new_store();
    let other = reopen(&dir);
    for key in [&b"alice"[..], b"bob", b"x", b"a-much-longer-key"] {
        assert_eq!(db.bucket_of(key), db.bucket_of(key));
        // identical across handles, as it must be for the shared file format
        assert_eq!(db.bucket_of(key), other.bucket_of(key));
    }
}
