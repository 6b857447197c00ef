//! Exact-match free-list allocator.
//!
//! Deleted records keep their exact on-disk footprint and are chained from
//! the head pointer at offset 0. Allocation accepts only a slot whose
//! stored key length and data length both match exactly - no best-fit and
//! no splitting, so reuse never changes how the files grow and existing
//! file pairs keep their layout.

use lock::LockKind;

use crate::{Result, Store};

impl Store {
    /// Searches the free list for an exact-size slot, unlinking and
    /// adopting it on success; the cursor fields then describe the slot.
    ///
    /// Runs with the target bucket's chain lock already held; the free-list
    /// lock nests inside it, in the fixed acquisition order every
    /// multi-lock operation follows.
    pub(crate) fn find_free(&mut self, key_len: usize, data_len: usize) -> Result<bool> {
        let free_off = self.cfg.free_list_off();
        let guard = lock::acquire(&self.idx, LockKind::Exclusive, free_off, 1)?;

        let mut prev_off = free_off;
        let mut offset = self.read_ptr(free_off)?;
        let mut found = false;
        while offset != 0 {
            self.read_idx_at(offset)?;
            if self.keylen == key_len && self.datlen == data_len {
                found = true;
                break;
            }
            prev_off = offset;
            offset = self.ptrval;
        }

        if found {
            // unlink: the predecessor takes over the slot's next pointer
            let next = self.ptrval;
            self.write_ptr(prev_off, next)?;
        }
        guard.release()?;
        Ok(found)
    }
}
