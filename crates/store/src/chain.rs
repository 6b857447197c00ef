//! Key hashing and bucket-chain resolution.

use lock::{LockKind, RegionGuard};

use crate::{Result, Store};

impl Store {
    /// Hash bucket for `key`: each byte times its 1-based position, summed,
    /// reduced modulo the table size. Purely a function of the key bytes,
    /// so identical across calls and process restarts - part of the file
    /// format, not tunable.
    pub(crate) fn bucket_of(&self, key: &[u8]) -> u64 {
        let mut hval: u64 = 0;
        for (i, &b) in key.iter().enumerate() {
            hval = hval.wrapping_add(u64::from(b).wrapping_mul(i as u64 + 1));
        }
        hval % self.cfg.nhash
    }

    /// Locks `key`'s bucket slot and walks its chain.
    ///
    /// On a match the cursor fields describe the found record; either way
    /// `ptroff` names the pointer field a mutation would rewrite (the
    /// bucket slot itself, or the predecessor record's next pointer). The
    /// returned guard is the chain lock; the calling operation holds it for
    /// its full duration.
    pub(crate) fn find_and_lock(
        &mut self,
        key: &[u8],
        kind: LockKind,
    ) -> Result<(bool, RegionGuard)> {
        self.chainoff = self.cfg.chain_slot_off(self.bucket_of(key));
        self.ptroff = self.chainoff;
        let guard = lock::acquire(&self.idx, kind, self.chainoff, 1)?;

        let mut offset = self.read_ptr(self.chainoff)?;
        while offset != 0 {
            self.read_idx_at(offset)?;
            if &self.idxbuf[..self.keylen] == key {
                return Ok((true, guard));
            }
            self.ptroff = offset;
            offset = self.ptrval;
        }
        Ok((false, guard))
    }
}
