//! # Lock - blocking advisory byte-range locks
//!
//! Cross-process coordination for TandemDB happens entirely through POSIX
//! advisory record locks (`fcntl` with `F_SETLKW`) on byte regions of the
//! index file, plus one whole-file region on the data file during appends.
//! There is no try-lock, no timeout, and no shared-to-exclusive upgrade;
//! every acquisition blocks until granted.
//!
//! [`acquire`] returns a [`RegionGuard`] that unlocks its exact region when
//! dropped, so an early `?` return still releases the region. Call
//! [`RegionGuard::release`] on success paths where an unlock failure should
//! be reported rather than swallowed.
//!
//! Advisory locks are per-process: two handles inside one process never
//! block each other, and closing *any* descriptor for a file drops all of
//! the process's locks on it. Callers keep one `File` open per store handle
//! for as long as any guard on it is alive.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lock::{acquire, LockKind};
//!
//! let file = std::fs::File::open("db.idx").unwrap();
//! let guard = acquire(&file, LockKind::Exclusive, 0, 1).unwrap();
//! // ... mutate the byte at offset 0 ...
//! guard.release().unwrap();
//! ```

use std::fs::File;
use std::io;
use std::mem::ManuallyDrop;
use std::os::unix::io::{AsRawFd, RawFd};

/// Whether a region is locked for reading (shared) or writing (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// Many processes may hold shared locks on overlapping regions at once.
    Shared,
    /// Excludes every other lock, shared or exclusive, on the region.
    Exclusive,
}

impl LockKind {
    fn lock_type(self) -> libc::c_short {
        match self {
            LockKind::Shared => libc::F_RDLCK as libc::c_short,
            LockKind::Exclusive => libc::F_WRLCK as libc::c_short,
        }
    }
}

/// An acquired advisory lock over `len` bytes starting at `start`.
///
/// `len == 0` covers from `start` to the end of the file, including any
/// bytes appended while the lock is held.
///
/// The guard records the raw descriptor rather than borrowing the `File`,
/// so a store handle can keep mutating itself while holding one. Dropping
/// the guard unlocks the region, ignoring errors; use [`release`] where the
/// error matters.
///
/// [`release`]: RegionGuard::release
#[derive(Debug)]
#[must_use = "dropping the guard immediately releases the region"]
pub struct RegionGuard {
    fd: RawFd,
    start: u64,
    len: u64,
}

impl RegionGuard {
    /// Unlocks the region, reporting any `fcntl` failure.
    pub fn release(self) -> io::Result<()> {
        let this = ManuallyDrop::new(self);
        set_lock(this.fd, libc::F_UNLCK as libc::c_short, this.start, this.len)
    }
}

impl Drop for RegionGuard {
    fn drop(&mut self) {
        let _ = set_lock(self.fd, libc::F_UNLCK as libc::c_short, self.start, self.len);
    }
}

/// Blocks until the requested lock over `[start, start + len)` is granted.
///
/// `len == 0` locks from `start` through end-of-file, POSIX-style. The call
/// is retried transparently when interrupted by a signal.
pub fn acquire(file: &File, kind: LockKind, start: u64, len: u64) -> io::Result<RegionGuard> {
    let fd = file.as_raw_fd();
    set_lock(fd, kind.lock_type(), start, len)?;
    Ok(RegionGuard { fd, start, len })
}

fn set_lock(fd: RawFd, lock_type: libc::c_short, start: u64, len: u64) -> io::Result<()> {
    // Field order of `struct flock` differs across platforms; zero it and
    // assign by name.
    let mut region: libc::flock = unsafe { std::mem::zeroed() };
    region.l_type = lock_type;
    region.l_whence = libc::SEEK_SET as libc::c_short;
    region.l_start = start as libc::off_t;
    region.l_len = len as libc::off_t;

    loop {
        // SAFETY: `fd` is a valid open descriptor for the guard's lifetime
        // and `region` is a fully initialized flock.
        let rc = unsafe { libc::fcntl(fd, libc::F_SETLKW, &region as *const libc::flock) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(test)]
mod tests;
