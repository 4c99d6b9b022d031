//! Pool-scoped directory handles.
//!
//! Mirrors alloc.c's `popendir`/`pclosedir`/`dir_cleanup`.

use std::cell::Cell;
use std::ffi::{CStr, CString};

use crate::error::{Error, Result};
use crate::pool::{CleanupHandle, Pool};

/// A `DIR *` handle whose lifetime is tied to a [`Pool`].
///
/// Closed on `exec` exactly like on destroy: alloc.c registers the same
/// `dir_cleanup` function for both halves, since a `DIR *` doesn't survive
/// an `exec` and leaving it open across one just leaks the descriptor(s)
/// backing it into the new program image.
pub struct PoolDirectory {
    dir: Cell<*mut libc::DIR>,
    cleanup: Cell<Option<CleanupHandle>>,
}

impl PoolDirectory {
    /// Opens `path` as a directory, registering it with `pool`.
    ///
    /// Mirrors alloc.c's `popendir`.
    pub fn open(pool: &Pool, path: &str) -> Result<PoolDirectory> {
        let cpath = CString::new(path).map_err(|_| Error::custom("path contains a NUL byte"))?;
        // SAFETY: `cpath` is a valid, NUL-terminated C string for the
        // duration of this call.
        let dir = unsafe { libc::opendir(cpath.as_ptr()) };
        if dir.is_null() {
            return Err(Error::from_errno());
        }

        let handle_dir = dir;
        let cell = Cell::new(dir);
        let handle = pool.register_cleanup(
            move || {
                // SAFETY: `handle_dir` was returned by `opendir` above and
                // hasn't been closed yet.
                unsafe {
                    libc::closedir(handle_dir);
                }
            },
            Some(Box::new(move || {
                // SAFETY: same as the on_destroy half above; `handle_dir`
                // is `Copy`, so both closures close the same DIR* exactly
                // once between them (only one of the two ever runs).
                unsafe {
                    libc::closedir(handle_dir);
                }
            })),
        );
        Ok(PoolDirectory {
            dir: cell,
            cleanup: Cell::new(Some(handle)),
        })
    }

    /// Reads the next directory entry's name, or `None` at end-of-stream.
    pub fn read_entry(&self) -> Option<String> {
        let dir = self.dir.get();
        if dir.is_null() {
            return None;
        }
        // SAFETY: `dir` is a live `DIR *` owned by this handle;
        // single-threaded access per pool's own contract.
        let entry = unsafe { libc::readdir(dir) };
        if entry.is_null() {
            return None;
        }
        // SAFETY: `d_name` is a NUL-terminated array within `*entry`.
        let name = unsafe { CStr::from_ptr((*entry).d_name.as_ptr()) };
        Some(name.to_string_lossy().into_owned())
    }

    /// Closes the directory immediately, unregistering its pool cleanup.
    ///
    /// Mirrors alloc.c's `pclosedir`.
    pub fn close(self, pool: &Pool) -> Result<()> {
        if let Some(handle) = self.cleanup.get() {
            pool.kill_cleanup(handle);
        }
        let dir = self.dir.replace(std::ptr::null_mut());
        if dir.is_null() {
            return Err(Error::InvalidHandle);
        }
        // SAFETY: `dir` hasn't been closed yet; the pool cleanup was just
        // unregistered above.
        if unsafe { libc::closedir(dir) } != 0 {
            return Err(Error::from_errno());
        }
        Ok(())
    }
}
