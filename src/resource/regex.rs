//! Pool-scoped compiled regular expressions.
//!
//! Mirrors alloc.c's `pregcomp`/`pregfree`/`regex_cleanup`. A compiled
//! regex holds no OS handle, so its cleanup is just "drop it" — but it's
//! still registered with the pool so the pattern is guaranteed to survive
//! only as long as its pool does, same as every other resource here, and
//! so a caller that wants it gone early still has `close`/`kill_cleanup`
//! available.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::pool::{CleanupHandle, Pool};

/// A compiled regular expression whose lifetime is tied to a [`Pool`].
pub struct PoolRegex {
    inner: Rc<RefCell<Option<Regex>>>,
    cleanup: Cell<Option<CleanupHandle>>,
}

impl PoolRegex {
    /// Compiles `pattern`, registering it with `pool`.
    ///
    /// Mirrors alloc.c's `pregcomp`.
    pub fn compile(pool: &Pool, pattern: &str) -> Result<PoolRegex> {
        let regex = Regex::new(pattern).map_err(|err| Error::InvalidPattern {
            message: err.to_string(),
        })?;
        let shared = Rc::new(RefCell::new(Some(regex)));
        let destroy_shared = Rc::clone(&shared);
        let exec_shared = Rc::clone(&shared);
        let handle = pool.register_cleanup(
            move || {
                destroy_shared.borrow_mut().take();
            },
            Some(Box::new(move || {
                exec_shared.borrow_mut().take();
            })),
        );
        Ok(PoolRegex {
            inner: shared,
            cleanup: Cell::new(Some(handle)),
        })
    }

    /// Runs `f` with the compiled pattern, if it hasn't already been
    /// freed.
    pub fn with<R>(&self, f: impl FnOnce(&Regex) -> R) -> Option<R> {
        self.inner.borrow().as_ref().map(f)
    }

    /// Whether `text` matches the pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.with(|re| re.is_match(text)).unwrap_or(false)
    }

    /// Frees the compiled pattern immediately, unregistering its pool
    /// cleanup.
    ///
    /// Mirrors alloc.c's `pregfree`.
    pub fn close(self, pool: &Pool) -> Result<()> {
        if let Some(handle) = self.cleanup.get() {
            pool.kill_cleanup(handle);
        }
        match self.inner.borrow_mut().take() {
            Some(regex) => drop(regex),
            None => return Err(Error::InvalidHandle),
        }
        Ok(())
    }
}
