//! Write path: `store()`, `delete()`, and blank-and-relink deletion.
//!
//! Both operations hold the target key's chain lock exclusively from the
//! find through the last pointer rewrite. Fresh records become reachable
//! only by the final bucket-head update, after their bytes are fully on
//! disk, so a concurrent reader can never be pointed at a half-written
//! record.

use config::StoreConfig;
use lock::LockKind;
use tracing::trace;

use crate::{Result, Store, StoreError, StoreMode};

/// Where a fresh record ended up.
enum Placement {
    Appended,
    Reused,
}

impl Store {
    /// Stores `data` under `key` according to `mode`.
    ///
    /// Insert-only on a present key returns [`StoreError::AlreadyExists`];
    /// replace-only on an absent key returns [`StoreError::NotFound`];
    /// neither mutates anything. A same-length replace rewrites the data
    /// record in place and leaves the index record untouched; a
    /// different-length replace deletes the old record and places the new
    /// value exactly like a fresh insert (free-slot reuse included).
    pub fn store(&mut self, key: &[u8], data: &[u8], mode: StoreMode) -> Result<()> {
        self.guarded(|s| s.store_inner(key, data, mode))
    }

    fn store_inner(&mut self, key: &[u8], data: &[u8], mode: StoreMode) -> Result<()> {
        if let Err(err) = validate_pair(&self.cfg, key, data) {
            self.stats.store_err += 1;
            return Err(err);
        }

        let (found, guard) = self.find_and_lock(key, LockKind::Exclusive)?;
        if found {
            match mode {
                StoreMode::Insert => {
                    self.stats.store_err += 1;
                    return Err(StoreError::AlreadyExists);
                }
                StoreMode::Replace | StoreMode::Upsert => {
                    if data.len() + 1 == self.datlen {
                        // cheapest path: lengths match, data only
                        self.write_dat_at(data, self.datoff)?;
                        self.stats.store_inplace += 1;
                    } else {
                        self.do_delete()?;
                        self.place_new(key, data)?;
                        self.stats.store_replace += 1;
                    }
                }
            }
        } else {
            match mode {
                StoreMode::Replace => {
                    self.stats.store_err += 1;
                    return Err(StoreError::NotFound);
                }
                StoreMode::Insert | StoreMode::Upsert => {
                    match self.place_new(key, data)? {
                        Placement::Appended => self.stats.store_append += 1,
                        Placement::Reused => self.stats.store_reuse += 1,
                    }
                }
            }
        }

        guard.release()?;
        trace!(key_len = key.len(), data_len = data.len(), "stored record");
        Ok(())
    }

    /// Deletes the record for `key`, blanking it in place and pushing it
    /// onto the free list. Absent keys return [`StoreError::NotFound`];
    /// deleting twice fails the same way.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.guarded(|s| s.delete_inner(key))
    }

    fn delete_inner(&mut self, key: &[u8]) -> Result<()> {
        let (found, guard) = self.find_and_lock(key, LockKind::Exclusive)?;
        if !found {
            self.stats.delete_err += 1;
            return Err(StoreError::NotFound);
        }
        self.do_delete()?;
        self.stats.delete_ok += 1;
        guard.release()?;
        trace!(key_len = key.len(), "deleted record");
        Ok(())
    }

    /// The not-found placement path, shared by insert and different-length
    /// replace: reuse an exact-size free slot when one exists, otherwise
    /// append to both files. The bucket head is rewritten last.
    fn place_new(&mut self, key: &[u8], data: &[u8]) -> Result<Placement> {
        let head = self.read_ptr(self.chainoff)?;
        if self.find_free(key.len(), data.len() + 1)? {
            let (idxoff, datoff) = (self.idxoff, self.datoff);
            self.write_dat_at(data, datoff)?;
            self.write_idx_at(key, idxoff, head)?;
            self.write_ptr(self.chainoff, idxoff)?;
            Ok(Placement::Reused)
        } else {
            self.append_dat(data)?;
            self.append_idx(key, head)?;
            self.write_ptr(self.chainoff, self.idxoff)?;
            Ok(Placement::Appended)
        }
    }

    /// Blanks the located record in place and pushes it to the head of the
    /// free list.
    ///
    /// Both the data record and the index body keep their offsets and
    /// lengths, with key and value bytes replaced by the fill byte, so the
    /// slot stays structurally valid for the scanner and for reuse. The
    /// caller holds the chain lock; the free-list lock nests inside it and
    /// covers the blanking, the head push, and the chain unlink.
    fn do_delete(&mut self) -> Result<()> {
        let blank_key = vec![codec::FILL; self.keylen];
        let blank_val = vec![codec::FILL; self.datlen - 1];
        let next_in_chain = self.ptrval;
        let free_off = self.cfg.free_list_off();

        let guard = lock::acquire(&self.idx, LockKind::Exclusive, free_off, 1)?;
        self.write_dat_at(&blank_val, self.datoff)?;
        let free_head = self.read_ptr(free_off)?;
        self.write_idx_at(&blank_key, self.idxoff, free_head)?;
        self.write_ptr(free_off, self.idxoff)?;
        self.write_ptr(self.ptroff, next_in_chain)?;
        guard.release()?;
        Ok(())
    }
}

/// Usage checks, all before any lock is taken.
fn validate_pair(cfg: &StoreConfig, key: &[u8], data: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::Usage("key must not be empty"));
    }
    if key.contains(&codec::SEP) {
        return Err(StoreError::Usage("key contains the field separator"));
    }
    if key.contains(&codec::NEWLINE) {
        return Err(StoreError::Usage("key contains a line break"));
    }
    if data.contains(&codec::NEWLINE) {
        return Err(StoreError::Usage("value contains a line break"));
    }
    let datlen = data.len() + 1;
    if datlen < cfg.dat_min || datlen > cfg.dat_max {
        return Err(StoreError::Usage("value length out of bounds"));
    }
    // worst case the body can reach with this key: both numeric fields at
    // their widest printable form
    let worst_body = key.len() + 2 + 20 + codec::decimal_width(cfg.dat_max as u64) + 1;
    if worst_body > cfg.idx_max {
        return Err(StoreError::Usage("key too long for index body bounds"));
    }
    Ok(())
}
