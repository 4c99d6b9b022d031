//! Pool-scoped file descriptors.
//!
//! Mirrors alloc.c's `popenf`/`pclosef`/`fd_cleanup`.

use std::cell::Cell;
use std::ffi::CString;
use std::os::unix::io::RawFd;

use crate::error::{Error, Result};
use crate::pool::{CleanupHandle, Pool};

/// A file descriptor whose lifetime is tied to a [`Pool`].
pub struct PoolDescriptor {
    fd: RawFd,
    cleanup: Cell<Option<CleanupHandle>>,
}

impl PoolDescriptor {
    /// Opens `path` with the given POSIX `open(2)` flags and mode,
    /// registering the resulting descriptor with `pool`.
    ///
    /// Mirrors alloc.c's `popenf`.
    pub fn open(pool: &Pool, path: &str, flags: i32, mode: u32) -> Result<PoolDescriptor> {
        let cpath = CString::new(path).map_err(|_| Error::custom("path contains a NUL byte"))?;
        // SAFETY: `cpath` is a valid, NUL-terminated C string for the
        // duration of this call.
        let fd = unsafe { libc::open(cpath.as_ptr(), flags, mode) };
        if fd < 0 {
            return Err(Error::from_errno());
        }
        Ok(Self::adopt(pool, fd))
    }

    /// Takes ownership of an already-open descriptor, registering it with
    /// `pool` so it's closed when the pool is cleared or destroyed.
    pub fn adopt(pool: &Pool, fd: RawFd) -> PoolDescriptor {
        let descriptor = PoolDescriptor {
            fd,
            cleanup: Cell::new(None),
        };
        let on_destroy_fd = fd;
        let on_exec_fd = fd;
        let handle = pool.register_cleanup(
            move || {
                // SAFETY: `fd` is owned by this cleanup and not used again
                // afterward.
                unsafe {
                    libc::close(on_destroy_fd);
                }
            },
            Some(Box::new(move || {
                // Forked children about to exec don't inherit this fd.
                unsafe {
                    libc::close(on_exec_fd);
                }
            })),
        );
        descriptor.cleanup.set(Some(handle));
        descriptor
    }

    /// The raw descriptor. Valid until this resource (or its pool) is
    /// closed/cleared/destroyed.
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Closes the descriptor immediately, unregistering its pool cleanup
    /// so it doesn't run a second time.
    ///
    /// Mirrors alloc.c's `pclosef`.
    pub fn close(self, pool: &Pool) -> Result<()> {
        if let Some(handle) = self.cleanup.get() {
            pool.kill_cleanup(handle);
        }
        // SAFETY: `self.fd` hasn't been closed yet — the pool cleanup was
        // just unregistered above.
        if unsafe { libc::close(self.fd) } != 0 {
            return Err(Error::from_errno());
        }
        Ok(())
    }
}
