//! Pool internals: the block chain, the child/parent tree, and lifecycle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::block::{self, Block};
use crate::config::AllocatorConfig;
use crate::subprocess::ProcessChain;

use super::cleanup::CleanupEntry;

pub(crate) struct PoolInner {
    pub(super) blocks: RefCell<Vec<Block>>,
    pub(super) cleanups: RefCell<Vec<CleanupEntry>>,
    pub(super) subprocesses: RefCell<ProcessChain>,
    pub(super) parent: RefCell<Option<Weak<PoolInner>>>,
    pub(super) children: RefCell<Vec<Rc<PoolInner>>>,
    pub(super) config: Rc<AllocatorConfig>,
    pub(super) next_cleanup_id: Cell<u64>,
}

impl PoolInner {
    pub(super) fn new(config: Rc<AllocatorConfig>, parent: Option<Weak<PoolInner>>) -> PoolInner {
        PoolInner {
            blocks: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            subprocesses: RefCell::new(ProcessChain::default()),
            parent: RefCell::new(parent),
            children: RefCell::new(Vec::new()),
            config,
            next_cleanup_id: Cell::new(0),
        }
    }

    pub(super) fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Total bytes held by this pool's own block chain (not its children).
    ///
    /// Mirrors alloc.c's `bytes_in_pool`.
    pub(super) fn bytes_in_pool(&self) -> usize {
        self.blocks.borrow().iter().map(Block::capacity).sum()
    }

    /// Recursively clears every descendant, runs this pool's own cleanups
    /// in registration order, reaps its subprocesses, then returns every
    /// block after the first to the shared free list and rewinds the
    /// first block's cursor back to empty. The pool itself remains usable
    /// afterward, and — since its first block is kept rather than cycled
    /// through the free list — the next allocation lands at the same
    /// address the very first allocation did.
    ///
    /// Mirrors alloc.c's `clear_pool` steps (i)-(v).
    pub(super) fn clear_recursive(&self) {
        let _guard = crate::interrupt::InterruptGuard::enter();

        for child in self.children.borrow_mut().drain(..) {
            child.clear_recursive();
        }

        self.run_destroy_cleanups();
        self.subprocesses.borrow_mut().reap_on_clear(self.config());

        let mut blocks = self.blocks.borrow_mut();
        if blocks.len() > 1 {
            let surplus: Vec<Block> = blocks.drain(1..).collect();
            block::store::release(surplus, self.config.sentinel_fill());
        }
        if let Some(first) = blocks.first() {
            first.reset(self.config.sentinel_fill());
        }
    }

    /// Releases every block still held by this pool (its first block,
    /// left in place by `clear_recursive`, included) to the shared free
    /// list. Only meaningful once the pool itself is being torn down.
    ///
    /// Mirrors the part of alloc.c's `destroy_pool` that frees the block
    /// the pool's own header lived in, after `clear_pool` has already run.
    pub(super) fn release_remaining_blocks(&self) {
        let blocks: Vec<Block> = self.blocks.borrow_mut().drain(..).collect();
        block::store::release(blocks, self.config.sentinel_fill());
    }
}
