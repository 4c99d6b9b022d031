//! The cleanup registry.
//!
//! alloc.c represents a cleanup as a `(data, plain_cleanup_fn,
//! child_cleanup_fn)` triple threaded onto the pool's `cleanups` list.
//! Here the pair of callbacks is expressed as boxed closures instead of a
//! `void*` plus two function pointers — the data the closures capture
//! plays the role of alloc.c's `data` argument.

use super::inner::PoolInner;

pub(crate) struct CleanupEntry {
    id: u64,
    on_destroy: Option<Box<dyn FnOnce()>>,
    on_exec: Option<Box<dyn FnOnce()>>,
}

/// Opaque token identifying a single registered cleanup within its pool.
///
/// Used to unregister ([`kill_cleanup`]-equivalent) or to force a single
/// cleanup to run early without destroying the whole pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupHandle(pub(crate) u64);

impl PoolInner {
    /// Registers a cleanup, returning a handle that can later unregister
    /// or force it. `on_exec` runs in a forked child just before `exec`;
    /// pass `None` (or `Some(Box::new(null_cleanup))`) if this resource has
    /// nothing to do there.
    pub(super) fn register_cleanup(
        &self,
        on_destroy: Box<dyn FnOnce()>,
        on_exec: Option<Box<dyn FnOnce()>>,
    ) -> CleanupHandle {
        let id = self.next_cleanup_id.get();
        self.next_cleanup_id.set(id + 1);
        let mut cleanups = self.cleanups.borrow_mut();
        cleanups.push(CleanupEntry {
            id,
            on_destroy: Some(on_destroy),
            on_exec,
        });
        CleanupHandle(id)
    }

    /// Unregisters a cleanup without running it. Returns `false` if the
    /// handle doesn't refer to a still-registered cleanup.
    ///
    /// Mirrors alloc.c's `kill_cleanup`.
    pub(super) fn kill_cleanup(&self, handle: CleanupHandle) -> bool {
        let mut cleanups = self.cleanups.borrow_mut();
        match cleanups.iter().position(|entry| entry.id == handle.0) {
            Some(index) => {
                cleanups.remove(index);
                true
            }
            None => false,
        }
    }

    /// Unregisters and immediately runs a single cleanup's `on_destroy`
    /// callback. Returns `false` if the handle was already gone.
    ///
    /// Mirrors alloc.c's `run_cleanup`.
    pub(super) fn run_cleanup(&self, handle: CleanupHandle) -> bool {
        let entry = {
            let mut cleanups = self.cleanups.borrow_mut();
            match cleanups.iter().position(|entry| entry.id == handle.0) {
                Some(index) => Some(cleanups.remove(index)),
                None => None,
            }
        };
        match entry {
            Some(mut entry) => {
                if let Some(on_destroy) = entry.on_destroy.take() {
                    on_destroy();
                }
                true
            }
            None => false,
        }
    }

    /// Runs every still-registered cleanup's `on_destroy` callback, in the
    /// order they were registered, then empties the registry.
    ///
    /// Registration order, not alloc.c's reverse (prepend + walk-from-head)
    /// order — see `DESIGN.md`'s pool/ entry for why this crate diverges.
    pub(super) fn run_destroy_cleanups(&self) {
        let entries: Vec<CleanupEntry> = self.cleanups.borrow_mut().drain(..).collect();
        for mut entry in entries {
            if let Some(on_destroy) = entry.on_destroy.take() {
                on_destroy();
            }
        }
    }

    /// Runs every still-registered cleanup's `on_exec` callback (if any)
    /// across this pool and every descendant, then clears each pool's
    /// cleanup list — an `on_exec` half never runs twice, and a forked
    /// child that goes on to call `exec` won't also run `on_destroy` for
    /// cleanups whose resources the exec already closed. Used just before
    /// a forked child calls `exec`.
    ///
    /// Mirrors alloc.c's `cleanup_pool_for_exec`/`cleanup_for_exec`, which
    /// runs `run_child_cleanups` and then sets `p->cleanups = NULL`.
    pub(super) fn run_for_exec_recursive(&self) {
        let entries: Vec<CleanupEntry> = self.cleanups.borrow_mut().drain(..).collect();
        for mut entry in entries {
            if let Some(on_exec) = entry.on_exec.take() {
                on_exec();
            }
        }
        for child in self.children.borrow().iter() {
            child.run_for_exec_recursive();
        }
    }
}

/// A cleanup callback that does nothing.
///
/// Mirrors alloc.c's `null_cleanup`, passed when a resource needs an
/// `on_destroy` handler but has nothing to do for `on_exec` (or vice
/// versa).
pub fn null_cleanup() {}
