//! # Store - TandemDB keyed-record engine
//!
//! An embeddable byte-string key → byte-string value store backed by exactly
//! two files sharing one base path: `<base>.idx` (hash table, chains, record
//! metadata) and `<base>.dat` (the values). Multiple cooperating processes
//! open the same pair concurrently and coordinate purely through advisory
//! byte-range locks on the index file - no server, no shared memory.
//!
//! ## Index file
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ free-list head pointer                 (ptr_width bytes) │
//! │ hash table: nhash chain pointers    (nhash × ptr_width)  │
//! │ '\n'                                                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ index record:                                            │
//! │ [next ptr][body len][key ':' data-off ':' data-len '\n'] │
//! ├──────────────────────────────────────────────────────────┤
//! │ ... more index records, in append order ...              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every pointer is a fixed-width ASCII decimal file offset; zero terminates
//! a chain. A record belongs to exactly one chain at a time: its key's hash
//! bucket while live, the free list once deleted. Deleted records are
//! blank-filled in place (never shrunk) and reused only by an exact
//! key-length/data-length match.
//!
//! ## Module responsibilities
//!
//! | Module        | Purpose                                              |
//! |---------------|------------------------------------------------------|
//! | `lib.rs`      | `Store` struct, open/close, errors, counters, `Debug`|
//! | [`record`]    | Pointer and record I/O against the two files         |
//! | [`chain`]     | Key hashing, bucket-chain walk under the chain lock  |
//! | [`free`]      | Exact-match free-list allocator                      |
//! | [`write`]     | `store()`, `delete()`, blank-and-relink deletion     |
//! | [`read`]      | `fetch()`, `rewind()`/`next_record()`, [`Records`]   |
//!
//! ## Locking
//!
//! ```text
//! chain lock   1 byte at the bucket slot; shared for fetch, exclusive for
//!              store/delete; held across the whole find-then-mutate call
//! free lock    1 byte at offset 0; exclusive to allocate/push, shared for
//!              the duration of each next_record() call
//! append lock  1 byte just past the index header, plus a to-EOF region on
//!              the data file; exclusive, held only across the append
//! ```
//!
//! Acquisitions block indefinitely and are never upgraded. When an operation
//! needs two locks it always takes the chain lock first, then the free-list
//! lock, so cooperating processes cannot deadlock.
//!
//! A `Store` is a single-owner handle: every operation takes `&mut self`,
//! and threads sharing one handle must serialize externally. Cross-process
//! sharing through the files is the supported concurrency model.
//!
//! ## Example
//!
//! ```rust,no_run
//! use store::{Store, StoreMode};
//!
//! let mut db = Store::create("/tmp/demo").unwrap();
//! db.store(b"alice", b"30", StoreMode::Upsert).unwrap();
//! assert_eq!(db.fetch(b"alice").unwrap().as_deref(), Some(&b"30"[..]));
//! db.delete(b"alice").unwrap();
//! ```

mod chain;
mod free;
mod read;
mod record;
mod write;

use std::fs::{File, OpenOptions};
use std::io;
use std::io::{Seek, SeekFrom, Write as _};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use codec::CodecError;
use config::ConfigError;
pub use config::StoreConfig;
use lock::LockKind;
pub use read::Records;
use thiserror::Error;
use tracing::debug;

/// Result alias for all store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by store operations.
///
/// `NotFound` and `AlreadyExists` are ordinary outcomes of `delete` and
/// `store`, not faults. Everything classified as a fault (I/O failure or
/// malformed on-disk data) poisons the handle: the files may be mid-update
/// and shared with other processes, so no further reads or writes are
/// attempted through this handle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not present (delete, or replace-only store).
    #[error("key not found")]
    NotFound,

    /// The key is already present (insert-only store).
    #[error("key already exists")]
    AlreadyExists,

    /// Invalid arguments, reported before any lock is taken.
    #[error("invalid argument: {0}")]
    Usage(&'static str),

    /// A structurally invalid record was read from disk.
    #[error("corrupt record at index offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: &'static str },

    /// A field failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The supplied geometry is internally inconsistent.
    #[error("store config: {0}")]
    Config(#[from] ConfigError),

    /// An underlying file operation failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The handle was poisoned by an earlier fault.
    #[error("store disabled by an earlier fault")]
    Faulted,
}

impl StoreError {
    /// Faults leave the on-disk state untrusted; normal outcomes do not.
    fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Corrupt { .. }
                | StoreError::Codec(_)
                | StoreError::Io(_)
                | StoreError::Faulted
        )
    }
}

/// How `store` treats an existing record for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Fail with `AlreadyExists` if the key is present.
    Insert,
    /// Fail with `NotFound` if the key is absent.
    Replace,
    /// Insert or replace as needed.
    Upsert,
}

/// Flags controlling how [`Store::open`] opens the file pair.
///
/// Both files are always opened readable. `mode` carries the permission
/// bits applied when `create` makes a new file.
#[derive(Debug, Clone, Copy)]
pub struct OpenFlags {
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub mode: u32,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            write: false,
            create: false,
            truncate: false,
            mode: 0o644,
        }
    }
}

impl OpenFlags {
    /// Read-only access to an existing pair.
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Read-write access to an existing pair.
    pub fn read_write() -> Self {
        Self {
            write: true,
            ..Self::default()
        }
    }

    /// Create (or wipe) the pair and initialize a fresh header.
    pub fn create() -> Self {
        Self {
            write: true,
            create: true,
            truncate: true,
            ..Self::default()
        }
    }

    /// Replaces the permission bits used when creating.
    pub fn with_mode(self, mode: u32) -> Self {
        Self { mode, ..self }
    }
}

/// Per-handle diagnostic counters, one per operation outcome.
///
/// Observability only; nothing reads these to make decisions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub fetch_ok: u64,
    pub fetch_err: u64,
    /// Fresh record appended to both files.
    pub store_append: u64,
    /// Fresh record written into a reused free slot.
    pub store_reuse: u64,
    /// Replace with a different value length (delete + re-place).
    pub store_replace: u64,
    /// Replace with the same value length (data rewritten in place).
    pub store_inplace: u64,
    pub store_err: u64,
    pub delete_ok: u64,
    pub delete_err: u64,
    pub next_ok: u64,
}

/// An open handle onto one index/data file pair.
///
/// Owns both descriptors, the reusable record buffers, and the cursor state
/// of the operation in flight. Dropping the handle closes the files; no
/// flush is needed because every mutation is written through synchronously.
pub struct Store {
    idx: File,
    dat: File,
    idx_path: PathBuf,
    dat_path: PathBuf,
    cfg: StoreConfig,

    /// Reusable index-record body buffer; `keylen` marks the key prefix.
    idxbuf: Vec<u8>,
    /// Reusable data-record buffer.
    datbuf: Vec<u8>,

    // Decoded state of the record most recently read or written. The chain
    // lock held by the surrounding operation keeps these coherent.
    idxoff: u64,
    idxlen: usize,
    keylen: usize,
    datoff: u64,
    datlen: usize,
    /// Chain pointer stored in the current record.
    ptrval: u64,
    /// Offset of the pointer field that names the current record.
    ptroff: u64,
    /// Bucket slot offset of the operation in flight.
    chainoff: u64,
    /// Sequential-scan cursor.
    iteroff: u64,

    stats: Stats,
    fault: bool,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("idx_path", &self.idx_path)
            .field("dat_path", &self.dat_path)
            .field("nhash", &self.cfg.nhash)
            .field("stats", &self.stats)
            .field("fault", &self.fault)
            .finish()
    }
}

impl Store {
    /// Opens (or creates) the pair `<base>.idx` / `<base>.dat`.
    ///
    /// When the flags both create and truncate, an empty index file gets a
    /// fresh all-zero header. The size check and the header write happen
    /// under an exclusive whole-file lock so concurrent creators cannot
    /// race each other.
    pub fn open(base: impl AsRef<Path>, flags: OpenFlags, cfg: StoreConfig) -> Result<Self> {
        cfg.validate()?;
        let base = base.as_ref();
        let idx_path = suffixed(base, ".idx");
        let dat_path = suffixed(base, ".dat");

        let mut opts = OpenOptions::new();
        opts.read(true)
            .write(flags.write)
            .create(flags.create)
            .truncate(flags.truncate);
        if flags.create {
            opts.mode(flags.mode);
        }
        let idx = opts.open(&idx_path)?;
        let dat = opts.open(&dat_path)?;

        let mut store = Self {
            idx,
            dat,
            idx_path,
            dat_path,
            cfg,
            idxbuf: Vec::with_capacity(cfg.idx_max),
            datbuf: Vec::with_capacity(cfg.dat_max),
            idxoff: 0,
            idxlen: 0,
            keylen: 0,
            datoff: 0,
            datlen: 0,
            ptrval: 0,
            ptroff: 0,
            chainoff: 0,
            iteroff: cfg.first_record_off(),
            stats: Stats::default(),
            fault: false,
        };

        if flags.create && flags.truncate {
            store.init_header()?;
        }
        store.rewind();
        debug!(base = %base.display(), "opened store");
        Ok(store)
    }

    /// Creates (or wipes) a store at `base` with the default geometry.
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        Self::open(base, OpenFlags::create(), StoreConfig::default())
    }

    /// Closes the handle. Equivalent to dropping it; provided for call-site
    /// symmetry with [`open`](Store::open).
    pub fn close(self) {}

    /// Snapshot of the per-outcome diagnostic counters.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Geometry this handle was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    /// Path of the index file.
    pub fn index_path(&self) -> &Path {
        &self.idx_path
    }

    /// Path of the data file.
    pub fn data_path(&self) -> &Path {
        &self.dat_path
    }

    /// Writes the all-zero header (free-list head, hash table, terminator)
    /// if the index file is still empty.
    fn init_header(&mut self) -> Result<()> {
        let guard = lock::acquire(&self.idx, LockKind::Exclusive, 0, 0)?;
        if self.idx.metadata()?.len() == 0 {
            let mut header = Vec::with_capacity(self.cfg.header_len() as usize);
            for _ in 0..=self.cfg.nhash {
                codec::encode_field(&mut header, 0, self.cfg.ptr_width)?;
            }
            header.push(codec::NEWLINE);
            self.idx.seek(SeekFrom::Start(0))?;
            self.idx.write_all(&header)?;
            debug!(slots = self.cfg.nhash, "initialized index header");
        }
        guard.release()?;
        Ok(())
    }

    /// Runs one operation against the poison flag: a poisoned handle
    /// refuses all work, and any fault raised by `op` poisons it.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.fault {
            return Err(StoreError::Faulted);
        }
        let result = op(self);
        if let Err(err) = &result {
            if err.is_fatal() {
                self.fault = true;
            }
        }
        result
    }
}

/// `<base>` + literal suffix, preserving any extension `base` already has.
fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests;
