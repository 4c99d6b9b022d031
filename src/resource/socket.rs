//! Pool-scoped sockets.
//!
//! Mirrors alloc.c's `psocket`/`pclosesocket`/`socket_cleanup`.

use std::cell::Cell;
use std::os::unix::io::RawFd;

use crate::error::{Error, Result};
use crate::pool::{CleanupHandle, Pool};

/// A socket descriptor whose lifetime is tied to a [`Pool`].
pub struct PoolSocket {
    fd: RawFd,
    cleanup: Cell<Option<CleanupHandle>>,
}

impl PoolSocket {
    /// Creates a socket via `socket(2)`, registering it with `pool`.
    ///
    /// Mirrors alloc.c's `psocket`.
    pub fn new(pool: &Pool, domain: i32, socket_type: i32, protocol: i32) -> Result<PoolSocket> {
        // SAFETY: plain `socket(2)` call, no preconditions beyond valid
        // integer arguments.
        let fd = unsafe { libc::socket(domain, socket_type, protocol) };
        if fd < 0 {
            return Err(Error::from_errno());
        }
        Ok(Self::adopt(pool, fd))
    }

    /// Takes ownership of an already-open socket descriptor, registering
    /// it with `pool`.
    pub fn adopt(pool: &Pool, fd: RawFd) -> PoolSocket {
        let on_destroy_fd = fd;
        let on_exec_fd = fd;
        let handle = pool.register_cleanup(
            move || {
                // SAFETY: `fd` is owned by this cleanup.
                unsafe {
                    libc::close(on_destroy_fd);
                }
            },
            Some(Box::new(move || {
                unsafe {
                    libc::close(on_exec_fd);
                }
            })),
        );
        PoolSocket {
            fd,
            cleanup: Cell::new(Some(handle)),
        }
    }

    /// The raw socket descriptor.
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Closes the socket immediately, unregistering its pool cleanup.
    ///
    /// Mirrors alloc.c's `pclosesocket`.
    pub fn close(self, pool: &Pool) -> Result<()> {
        if let Some(handle) = self.cleanup.get() {
            pool.kill_cleanup(handle);
        }
        // SAFETY: `self.fd` hasn't been closed yet.
        if unsafe { libc::close(self.fd) } != 0 {
            return Err(Error::from_errno());
        }
        Ok(())
    }
}
