//! Pointer and record I/O against the index and data files.
//!
//! Everything here works on the handle's cursor fields: reads decode into
//! them, writes leave them describing what was just written. Chain and
//! free-list traversal, the operations, and the scanner are all built from
//! these primitives. Decoding goes through the `codec` crate and is
//! bounds-checked against the configured geometry; any violation is a
//! corruption fault.

use std::io;
use std::io::{Read, Seek, SeekFrom, Write as _};

use lock::LockKind;

use crate::{Result, Store, StoreError};

impl Store {
    /// Reads one chain-pointer field: the free-list head, a hash slot, or
    /// an index record's next pointer.
    pub(crate) fn read_ptr(&mut self, off: u64) -> Result<u64> {
        let width = self.cfg.ptr_width;
        let mut field = [0u8; 19];
        self.idx.seek(SeekFrom::Start(off))?;
        self.idx
            .read_exact(&mut field[..width])
            .map_err(|e| read_fault(e, off, "truncated pointer field"))?;
        Ok(codec::decode_field(&field[..width])?)
    }

    /// Writes one chain-pointer field at `off`.
    pub(crate) fn write_ptr(&mut self, off: u64, ptrval: u64) -> Result<()> {
        let mut field = Vec::with_capacity(self.cfg.ptr_width);
        codec::encode_field(&mut field, ptrval, self.cfg.ptr_width)?;
        self.idx.seek(SeekFrom::Start(off))?;
        self.idx.write_all(&field)?;
        Ok(())
    }

    /// Reads and decodes the index record at `off`. Running past
    /// end-of-file here means a pointer was dangling: a corruption fault.
    pub(crate) fn read_idx_at(&mut self, off: u64) -> Result<()> {
        let hdr_len = self.cfg.ptr_width + self.cfg.len_width;
        let mut hdr = [0u8; 38];
        self.idx.seek(SeekFrom::Start(off))?;
        self.idx
            .read_exact(&mut hdr[..hdr_len])
            .map_err(|e| read_fault(e, off, "truncated index record"))?;
        self.decode_idx(off, &hdr[..hdr_len])
    }

    /// Reads the next sequential index record at the scan cursor and
    /// advances past it. Returns `false` at end-of-file.
    pub(crate) fn read_idx_next(&mut self) -> Result<bool> {
        let off = self.iteroff;
        let hdr_len = self.cfg.ptr_width + self.cfg.len_width;
        let mut hdr = [0u8; 38];
        self.idx.seek(SeekFrom::Start(off))?;
        match self.idx.read_exact(&mut hdr[..hdr_len]) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        self.decode_idx(off, &hdr[..hdr_len])?;
        self.iteroff = off + (hdr_len + self.idxlen) as u64;
        Ok(true)
    }

    /// Decodes a record whose fixed header was just read from `off`; the
    /// file position is at the body. Fills every cursor field.
    fn decode_idx(&mut self, off: u64, hdr: &[u8]) -> Result<()> {
        let width = self.cfg.ptr_width;
        self.ptrval = codec::decode_field(&hdr[..width])?;
        let idxlen = codec::decode_field(&hdr[width..])? as usize;
        if idxlen < self.cfg.idx_min || idxlen > self.cfg.idx_max {
            return Err(StoreError::Corrupt {
                offset: off,
                reason: "index body length out of bounds",
            });
        }

        self.idxbuf.resize(idxlen, 0);
        self.idx
            .read_exact(&mut self.idxbuf)
            .map_err(|e| read_fault(e, off, "truncated index body"))?;

        let body = codec::parse_body(&self.idxbuf)?;
        if body.data_len == 0 || body.data_len > self.cfg.dat_max as u64 {
            return Err(StoreError::Corrupt {
                offset: off,
                reason: "data length out of bounds",
            });
        }

        self.idxoff = off;
        self.idxlen = idxlen;
        self.keylen = body.key_len;
        self.datoff = body.data_off;
        self.datlen = body.data_len as usize;
        Ok(())
    }

    /// Reads the current data record, verifies its terminator, and returns
    /// the value bytes.
    pub(crate) fn read_dat(&mut self) -> Result<Vec<u8>> {
        self.datbuf.resize(self.datlen, 0);
        self.dat.seek(SeekFrom::Start(self.datoff))?;
        self.dat
            .read_exact(&mut self.datbuf)
            .map_err(|e| read_fault(e, self.idxoff, "truncated data record"))?;
        if self.datbuf[self.datlen - 1] != codec::NEWLINE {
            return Err(StoreError::Corrupt {
                offset: self.idxoff,
                reason: "missing data terminator",
            });
        }
        Ok(self.datbuf[..self.datlen - 1].to_vec())
    }

    /// Overwrites the data record at `off` in place. The chain lock held by
    /// the surrounding operation already serializes every writer of this
    /// record, so no data-file lock is taken.
    pub(crate) fn write_dat_at(&mut self, data: &[u8], off: u64) -> Result<()> {
        self.dat.seek(SeekFrom::Start(off))?;
        self.write_dat_frame(data)?;
        self.datoff = off;
        Ok(())
    }

    /// Appends a fresh data record under an exclusive to-EOF lock on the
    /// data file, released as soon as the write lands.
    pub(crate) fn append_dat(&mut self, data: &[u8]) -> Result<()> {
        let guard = lock::acquire(&self.dat, LockKind::Exclusive, 0, 0)?;
        let off = self.dat.seek(SeekFrom::End(0))?;
        self.write_dat_frame(data)?;
        self.datoff = off;
        guard.release()?;
        Ok(())
    }

    /// Value plus terminator, in one write.
    fn write_dat_frame(&mut self, data: &[u8]) -> Result<()> {
        self.datbuf.clear();
        self.datbuf.extend_from_slice(data);
        self.datbuf.push(codec::NEWLINE);
        self.dat.write_all(&self.datbuf)?;
        self.datlen = data.len() + 1;
        Ok(())
    }

    /// Rewrites the index record at `off` in place, pairing `key` with the
    /// data record described by the cursor (`write_dat_at`/`append_dat` run
    /// first and leave `datoff`/`datlen` set).
    pub(crate) fn write_idx_at(&mut self, key: &[u8], off: u64, ptrval: u64) -> Result<()> {
        self.idx.seek(SeekFrom::Start(off))?;
        self.write_idx_frame(key, off, ptrval)
    }

    /// Appends a fresh index record under the exclusive one-byte append
    /// lock, released as soon as the write lands.
    pub(crate) fn append_idx(&mut self, key: &[u8], ptrval: u64) -> Result<()> {
        let guard = lock::acquire(
            &self.idx,
            LockKind::Exclusive,
            self.cfg.append_lock_off(),
            1,
        )?;
        let off = self.idx.seek(SeekFrom::End(0))?;
        self.write_idx_frame(key, off, ptrval)?;
        guard.release()?;
        Ok(())
    }

    /// Builds `[next ptr][body len][body]` and writes it at the current
    /// file position, leaving the cursor fields describing the record.
    fn write_idx_frame(&mut self, key: &[u8], off: u64, ptrval: u64) -> Result<()> {
        self.idxbuf.clear();
        codec::build_body(&mut self.idxbuf, key, self.datoff, self.datlen as u64);
        let body_len = self.idxbuf.len();
        if body_len < self.cfg.idx_min || body_len > self.cfg.idx_max {
            return Err(StoreError::Usage("index body length out of bounds"));
        }

        let mut frame =
            Vec::with_capacity(self.cfg.ptr_width + self.cfg.len_width + body_len);
        codec::encode_field(&mut frame, ptrval, self.cfg.ptr_width)?;
        codec::encode_field(&mut frame, body_len as u64, self.cfg.len_width)?;
        frame.extend_from_slice(&self.idxbuf);
        self.idx.write_all(&frame)?;

        self.idxoff = off;
        self.idxlen = body_len;
        self.keylen = key.len();
        self.ptrval = ptrval;
        Ok(())
    }
}

/// Hitting end-of-file while a record should be there is corruption, not a
/// clean I/O failure.
fn read_fault(err: io::Error, offset: u64, reason: &'static str) -> StoreError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        StoreError::Corrupt { offset, reason }
    } else {
        StoreError::Io(err)
    }
}
