use crate::{OpenFlags, Store, StoreConfig, StoreMode};
use tempfile::{tempdir, TempDir};

/// Fresh store named `db` inside its own temp directory.
pub fn new_store() -> (TempDir, Store) {
    let dir = tempdir().unwrap();
    let store = Store::create(dir.path().join("db")).unwrap();
    (dir, store)
}

/// Opens a second (or later) handle onto the pair created by `new_store`.
pub fn reopen(dir: &TempDir) -> Store {
    Store::open(
        dir.path().join("db"),
        OpenFlags::read_write(),
        StoreConfig::default(),
    )
    .unwrap()
}

/// Current sizes of the index and data files.
pub fn file_sizes(store: &Store) -> (u64, u64) {
    (
        std::fs::metadata(store.index_path()).unwrap().len(),
        std::fs::metadata(store.data_path()).unwrap().len(),
    )
}

pub fn upsert(store: &mut Store, key: &[u8], value: &[u8]) {
    store.store(key, value, StoreMode::Upsert).unwrap();
}

/// Drains a full scan into (key, value) pairs.
pub fn drain(store: &mut Store) -> Vec<(Vec<u8>, Vec<u8>)> {
    store.records().collect::<Result<Vec<_>, _>>().unwrap()
}
