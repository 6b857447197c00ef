//! Read path: `fetch()`, the sequential scan, and the [`Records`] adapter.

use lock::LockKind;
use tracing::trace;

use crate::{Result, Store};

impl Store {
    /// Looks up `key`, returning `Ok(Some(value))` if present.
    ///
    /// Holds a shared lock on the key's bucket slot for the whole call, so
    /// a concurrent writer of the same chain is excluded but other readers
    /// are not.
    pub fn fetch(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.guarded(|s| s.fetch_inner(key))
    }

    fn fetch_inner(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let (found, guard) = self.find_and_lock(key, LockKind::Shared)?;
        if !found {
            self.stats.fetch_err += 1;
            return Ok(None);
        }
        let value = self.read_dat()?;
        self.stats.fetch_ok += 1;
        guard.release()?;
        trace!(key_len = key.len(), data_len = value.len(), "fetched record");
        Ok(Some(value))
    }

    /// Repositions the sequential scan at the first index record, directly
    /// after the header.
    pub fn rewind(&mut self) {
        self.iteroff = self.cfg.first_record_off();
    }

    /// Returns the next live record in physical file order, or `Ok(None)`
    /// at end-of-file.
    ///
    /// Each call takes a shared lock on the free-list head for its
    /// duration - a global serialization point against concurrent deletes
    /// and slot reuse, not a per-record lock. A full rewind-to-end pass
    /// visits every live record exactly once when no other process writes;
    /// interleaved writes from other processes may make the scan skip or
    /// duplicate a record, which callers must tolerate.
    pub fn next_record(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.guarded(|s| s.next_inner())
    }

    fn next_inner(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let guard = lock::acquire(&self.idx, LockKind::Shared, self.cfg.free_list_off(), 1)?;

        let live = loop {
            if !self.read_idx_next()? {
                break false;
            }
            // an all-blank key is a deleted slot awaiting reuse
            if self.idxbuf[..self.keylen].iter().all(|&b| b == codec::FILL) {
                continue;
            }
            break true;
        };
        if !live {
            guard.release()?;
            return Ok(None);
        }

        let key = self.idxbuf[..self.keylen].to_vec();
        let value = self.read_dat()?;
        self.stats.next_ok += 1;
        guard.release()?;
        Ok(Some((key, value)))
    }

    /// Rewinds and returns an iterator over every live record.
    ///
    /// Order is physical file order - neither insertion nor key order.
    pub fn records(&mut self) -> Records<'_> {
        self.rewind();
        Records {
            store: self,
            done: false,
        }
    }
}

/// Iterator over live records, produced by [`Store::records`].
///
/// Yields `Err` at most once and then fuses if the underlying scan faults.
#[derive(Debug)]
pub struct Records<'a> {
    store: &'a mut Store,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.next_record() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
