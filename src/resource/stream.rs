//! Pool-scoped buffered file streams.
//!
//! Mirrors alloc.c's `pfopen`/`pfdopen`/`pfclose`/`file_cleanup`/
//! `file_child_cleanup`.

use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::pool::{CleanupHandle, Pool};

/// A buffered file stream whose lifetime is tied to a [`Pool`].
///
/// Unlike [`crate::resource::PoolDescriptor`], this wraps a full
/// `std::fs::File` (so callers get `Read`/`Write`/`Seek`), but the
/// decision of *when* it closes still belongs to the pool, not to
/// whenever the handle happens to go out of scope.
pub struct PoolStream {
    file: Rc<RefCell<Option<File>>>,
    cleanup: Cell<Option<CleanupHandle>>,
}

impl PoolStream {
    /// Opens `path` with `options`, registering the resulting stream with
    /// `pool`.
    ///
    /// Mirrors alloc.c's `pfopen`.
    pub fn open(pool: &Pool, path: &str, options: &OpenOptions) -> Result<PoolStream> {
        let file = options.open(path)?;
        Ok(Self::adopt(pool, file))
    }

    /// Takes ownership of an already-open `File`, registering it with
    /// `pool`.
    ///
    /// Mirrors alloc.c's `pfdopen`.
    pub fn adopt(pool: &Pool, file: File) -> PoolStream {
        let fd = file.as_raw_fd();
        let shared = Rc::new(RefCell::new(Some(file)));
        let destroy_shared = Rc::clone(&shared);
        let handle = pool.register_cleanup(
            move || {
                destroy_shared.borrow_mut().take();
            },
            Some(Box::new(move || {
                // SAFETY: closing this fd number in the forked child's own
                // fd table doesn't affect the parent's open file.
                unsafe {
                    libc::close(fd);
                }
            })),
        );
        PoolStream {
            file: shared,
            cleanup: Cell::new(Some(handle)),
        }
    }

    /// Runs `f` with mutable access to the underlying file, if it hasn't
    /// already been closed.
    pub fn with<R>(&self, f: impl FnOnce(&mut File) -> R) -> Option<R> {
        self.file.borrow_mut().as_mut().map(f)
    }

    /// Closes the stream immediately, unregistering its pool cleanup.
    ///
    /// Mirrors alloc.c's `pfclose`.
    pub fn close(self, pool: &Pool) -> Result<()> {
        if let Some(handle) = self.cleanup.get() {
            pool.kill_cleanup(handle);
        }
        match self.file.borrow_mut().take() {
            Some(file) => drop(file),
            None => return Err(Error::InvalidHandle),
        }
        Ok(())
    }
}
