//! Pools: hierarchical, scoped, bump-allocating memory arenas.
//!
//! A [`Pool`] is a cheap handle (`Rc<PoolInner>` underneath) to a node in
//! a tree of arenas. Allocating from a pool never frees individual
//! objects; instead, [`Pool::clear`] or [`Pool::destroy`] frees everything
//! the pool (and, recursively, its children) ever handed out, in one
//! shot. Single-threaded by design — see the crate-level docs for why.

mod alloc;
pub(crate) mod cleanup;
mod inner;

pub use cleanup::{null_cleanup, CleanupHandle};

use std::rc::{Rc, Weak};

use crate::config::AllocatorConfig;
use inner::PoolInner;

/// A handle to a hierarchical memory arena.
///
/// Cloning a `Pool` is cheap (it's a reference-counted handle to the same
/// underlying arena, not a copy of its contents) but `Pool` is
/// deliberately `!Send` and `!Sync`: the tree it belongs to has exactly
/// one owner at a time, matching alloc.c's original single-threaded
/// contract (only the shared block free list is synchronized).
#[derive(Clone)]
pub struct Pool(Rc<PoolInner>);

impl Pool {
    /// Creates a new root pool with no parent.
    ///
    /// Mirrors alloc.c's `init_alloc` followed by `make_sub_pool(NULL)`.
    pub fn new(config: AllocatorConfig) -> Pool {
        Pool(Rc::new(PoolInner::new(Rc::new(config), None)))
    }

    fn inner(&self) -> &PoolInner {
        &self.0
    }

    /// Creates a child pool. The child is destroyed automatically when
    /// this pool is cleared or destroyed, and inherits this pool's
    /// configuration.
    ///
    /// Mirrors alloc.c's `make_sub_pool`.
    pub fn make_sub_pool(&self) -> Pool {
        let child = Rc::new(PoolInner::new(
            Rc::clone(&self.0.config),
            Some(Rc::downgrade(&self.0)),
        ));
        self.0.children.borrow_mut().push(Rc::clone(&child));
        Pool(child)
    }

    /// Destroys every descendant, runs this pool's own cleanups in
    /// registration order, and returns all of its blocks to the shared
    /// free list. The pool itself is left empty but still usable.
    ///
    /// # Invariant
    ///
    /// Every `&mut [u8]`/`&str` this pool (or any descendant) has ever
    /// handed out from [`Pool::alloc`] and friends, or that an [`Array`]
    /// or [`crate::Table`] built on it is still holding, becomes invalid
    /// the instant this call returns — the memory is reused or
    /// sentinel-stamped in place. The borrow checker cannot see this,
    /// because those references only borrow `&self`, not `&mut self`:
    /// callers are responsible for not reading through any such reference
    /// after calling `clear`, the same contract alloc.c's callers hold by
    /// convention around `clear_pool`.
    ///
    /// Mirrors alloc.c's `clear_pool`.
    ///
    /// [`Array`]: crate::Array
    pub fn clear(&self) {
        self.0.clear_recursive();
    }

    /// Like [`Pool::clear`], and additionally detaches this pool from its
    /// parent's child list and releases the block `clear` otherwise keeps
    /// in reserve, so the parent no longer keeps it alive.
    ///
    /// Carries the same invariant as [`Pool::clear`]: no reference derived
    /// from this pool's memory may be read after this call.
    ///
    /// Mirrors alloc.c's `destroy_pool`.
    pub fn destroy(&self) {
        self.0.clear_recursive();
        self.0.release_remaining_blocks();
        if let Some(parent) = self.parent_inner() {
            parent
                .children
                .borrow_mut()
                .retain(|child| !Rc::ptr_eq(child, &self.0));
        }
    }

    fn parent_inner(&self) -> Option<Rc<PoolInner>> {
        self.0.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Bytes held by this pool's own block chain (not its children's).
    ///
    /// Mirrors alloc.c's `bytes_in_pool`.
    pub fn bytes_in_pool(&self) -> usize {
        self.0.bytes_in_pool()
    }

    /// Bytes currently sitting in the process-wide free list, available
    /// for reuse by any pool.
    ///
    /// Mirrors alloc.c's `bytes_in_free_blocks`.
    pub fn bytes_in_free_blocks() -> usize {
        crate::block::store::bytes_in_free_blocks()
    }

    /// Returns this pool's parent, if it has one and the parent hasn't
    /// already been destroyed.
    pub fn parent(&self) -> Option<Pool> {
        self.parent_inner().map(Pool)
    }

    /// Walks up the tree from `self`, returning `true` if `ancestor` is
    /// `self` itself or any of its ancestors.
    ///
    /// Debug-only ancestry check supplementing alloc.c's implicit
    /// assumption that callers never pass a pool that outlives its parent.
    pub fn is_descendant_of(&self, ancestor: &Pool) -> bool {
        let mut current = Rc::clone(&self.0);
        loop {
            if Rc::ptr_eq(&current, &ancestor.0) {
                return true;
            }
            match current.parent.borrow().as_ref().and_then(Weak::upgrade) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Registers a cleanup that runs when this pool is cleared or
    /// destroyed. `on_exec` (if given) runs instead, without removing the
    /// `on_destroy` half, just before a forked child calls `exec`.
    ///
    /// Mirrors alloc.c's `register_cleanup`.
    pub fn register_cleanup(
        &self,
        on_destroy: impl FnOnce() + 'static,
        on_exec: Option<Box<dyn FnOnce()>>,
    ) -> CleanupHandle {
        self.0.register_cleanup(Box::new(on_destroy), on_exec)
    }

    /// Unregisters a cleanup without running it.
    ///
    /// Mirrors alloc.c's `kill_cleanup`.
    pub fn kill_cleanup(&self, handle: CleanupHandle) -> bool {
        self.0.kill_cleanup(handle)
    }

    /// Unregisters and immediately runs a single cleanup.
    ///
    /// Mirrors alloc.c's `run_cleanup`.
    pub fn run_cleanup(&self, handle: CleanupHandle) -> bool {
        self.0.run_cleanup(handle)
    }

    /// Runs every `on_exec` callback across this pool and its descendants,
    /// then clears every cleanup list it and its descendants hold. Call
    /// this in a forked child right before `exec`.
    ///
    /// Mirrors alloc.c's `cleanup_pool_for_exec`.
    pub fn prepare_for_exec(&self) {
        self.0.run_for_exec_recursive();
    }

    /// When `track_pool_ownership` debug mode is enabled, aborts the
    /// process unless `source` is this pool itself or one of its
    /// ancestors.
    ///
    /// Used to validate that a value borrowed directly from `source`'s
    /// memory (rather than copied) cannot outlive the pool it's being
    /// borrowed into: destroying an ancestor always destroys `self` first,
    /// as part of the same recursive teardown, so `source` being `self` or
    /// an ancestor of `self` guarantees `source` is never torn down before
    /// `self` is. [`crate::Table::set_borrowed`]/[`crate::Table::add_borrowed`]
    /// are the enforcement points spec.md names for this check.
    pub fn debug_assert_borrowed_from(&self, source: &Pool) {
        if !self.config().track_pool_ownership() {
            return;
        }
        if Rc::ptr_eq(&self.0, &source.0) || self.is_descendant_of(source) {
            return;
        }
        crate::fatal::pool_ownership_violation();
    }

    pub(crate) fn subprocesses(&self) -> &std::cell::RefCell<crate::subprocess::ProcessChain> {
        &self.0.subprocesses
    }

    pub(crate) fn config(&self) -> &AllocatorConfig {
        self.0.config()
    }

    pub(crate) fn inner_blocks(&self) -> &std::cell::RefCell<Vec<crate::block::Block>> {
        &self.0.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_pool_is_destroyed_along_with_parent() {
        let parent = Pool::new(AllocatorConfig::default());
        let child = parent.make_sub_pool();
        let ran = std::rc::Rc::new(std::cell::RefCell::new(false));
        let ran_clone = std::rc::Rc::clone(&ran);
        child.register_cleanup(move || *ran_clone.borrow_mut() = true, None);

        parent.destroy();
        assert!(*ran.borrow());
    }

    #[test]
    fn destroy_detaches_from_parent() {
        let parent = Pool::new(AllocatorConfig::default());
        let child = parent.make_sub_pool();
        child.destroy();
        assert_eq!(parent.0.children.borrow().len(), 0);
    }

    #[test]
    fn is_descendant_of_walks_the_tree() {
        let root = Pool::new(AllocatorConfig::default());
        let mid = root.make_sub_pool();
        let leaf = mid.make_sub_pool();

        assert!(leaf.is_descendant_of(&root));
        assert!(leaf.is_descendant_of(&mid));
        assert!(!root.is_descendant_of(&leaf));
    }

    #[test]
    fn clear_keeps_the_pool_usable() {
        let pool = Pool::new(AllocatorConfig::default());
        pool.alloc(64).unwrap();
        let capacity_before = pool.bytes_in_pool();
        pool.clear();
        // The first block is kept (not cycled through the free list), so
        // the capacity count doesn't change — only the live/dead split
        // within it does.
        assert_eq!(pool.bytes_in_pool(), capacity_before);
        // still usable after clearing
        pool.alloc(16).unwrap();
        assert_eq!(pool.bytes_in_pool(), capacity_before);
    }
}
