//! # Config - store geometry and record bounds
//!
//! A [`StoreConfig`] fixes the on-disk geometry of one database file pair:
//! the hash-table size, the widths of the fixed ASCII pointer and length
//! fields, and the permitted index-body and data-record lengths. Every
//! derived file offset (header length, bucket slot positions, the append
//! lock region) is computed here so the engine never hand-rolls layout
//! arithmetic.
//!
//! Two processes opening the same file pair must use identical geometry;
//! the values are not stored in the files themselves.
//!
//! ## Index-file header, as derived from a config
//!
//! ```text
//! offset 0:                 free-list head pointer   (ptr_width bytes)
//! offset ptr_width:         hash table               (nhash * ptr_width bytes)
//! offset (nhash+1)*W:       '\n' header terminator   (1 byte)
//! offset (nhash+1)*W + 1:   first index record / append-lock byte
//! ```

use thiserror::Error;

/// Errors from [`StoreConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("hash table must have at least one slot")]
    NoSlots,

    #[error("pointer field width {0} out of range (1..=19)")]
    PtrWidth(usize),

    #[error("length field width {0} out of range (1..=19)")]
    LenWidth(usize),

    #[error("index body bounds {min}..={max} are invalid")]
    IdxBounds { min: usize, max: usize },

    #[error("index body max {max} does not fit a {width}-byte length field")]
    LenFieldTooNarrow { max: usize, width: usize },

    #[error("data record bounds {min}..={max} are invalid")]
    DatBounds { min: usize, max: usize },
}

/// Geometry and bounds for one database file pair.
///
/// The defaults describe the standard format: 137 hash slots, 7-byte
/// pointer fields, 4-byte length fields, index bodies of 6..=1024 bytes,
/// and data records of 1..=1024 bytes (lengths include the terminator, so
/// an empty value is a legal 1-byte data record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of hash-table slots.
    pub nhash: u64,
    /// Width in bytes of every chain-pointer field.
    pub ptr_width: usize,
    /// Width in bytes of the index-record body-length field.
    pub len_width: usize,
    /// Minimum index-record body length, terminator included.
    pub idx_min: usize,
    /// Maximum index-record body length, terminator included.
    pub idx_max: usize,
    /// Minimum data-record length, terminator included.
    pub dat_min: usize,
    /// Maximum data-record length, terminator included.
    pub dat_max: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            nhash: 137,
            ptr_width: 7,
            len_width: 4,
            idx_min: 6,
            idx_max: 1024,
            dat_min: 1,
            dat_max: 1024,
        }
    }
}

impl StoreConfig {
    /// Checks the geometry for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nhash == 0 {
            return Err(ConfigError::NoSlots);
        }
        if !(1..=19).contains(&self.ptr_width) {
            return Err(ConfigError::PtrWidth(self.ptr_width));
        }
        if !(1..=19).contains(&self.len_width) {
            return Err(ConfigError::LenWidth(self.len_width));
        }
        if self.idx_min == 0 || self.idx_min > self.idx_max {
            return Err(ConfigError::IdxBounds {
                min: self.idx_min,
                max: self.idx_max,
            });
        }
        if self.idx_max as u64 > field_cap(self.len_width) {
            return Err(ConfigError::LenFieldTooNarrow {
                max: self.idx_max,
                width: self.len_width,
            });
        }
        if self.dat_min == 0 || self.dat_min > self.dat_max {
            return Err(ConfigError::DatBounds {
                min: self.dat_min,
                max: self.dat_max,
            });
        }
        Ok(())
    }

    /// Offset of the free-list head pointer.
    pub fn free_list_off(&self) -> u64 {
        0
    }

    /// Offset of the first hash-table slot.
    pub fn hash_table_off(&self) -> u64 {
        self.ptr_width as u64
    }

    /// Offset of the chain-pointer slot for `bucket`.
    pub fn chain_slot_off(&self, bucket: u64) -> u64 {
        self.hash_table_off() + bucket * self.ptr_width as u64
    }

    /// Total header length: free-list pointer, hash table, terminator.
    pub fn header_len(&self) -> u64 {
        (self.nhash + 1) * self.ptr_width as u64 + 1
    }

    /// Offset of the first index record, directly after the header.
    pub fn first_record_off(&self) -> u64 {
        self.header_len()
    }

    /// Offset of the one-byte region serializing index-file appends.
    pub fn append_lock_off(&self) -> u64 {
        self.header_len()
    }

    /// Largest file offset a pointer field can represent.
    pub fn max_ptr(&self) -> u64 {
        field_cap(self.ptr_width)
    }
}

/// Largest value a `width`-digit decimal field can hold.
fn field_cap(width: usize) -> u64 {
    10u64.pow(width as u32) - 1
}

#[cfg(test)]
mod tests;
