//! The process-wide free list.
//!
//! Exactly one free list exists per process, guarded by exactly one mutex
//! (`alloc_mutex` in alloc.c). Pools never hold blocks directly once
//! they're done with them; they hand them back here, and the next pool
//! that needs a block of roughly the same size gets it back instead of
//! going to the system allocator.

use std::sync::OnceLock;

#[cfg(feature = "parking_lot")]
use parking_lot::Mutex;
#[cfg(not(feature = "parking_lot"))]
use std::sync::Mutex;

use crate::config::AllocatorConfig;

use super::Block;

struct FreeList {
    blocks: Mutex<Vec<Block>>,
}

static FREE_LIST: OnceLock<FreeList> = OnceLock::new();

fn free_list() -> &'static FreeList {
    FREE_LIST.get_or_init(|| FreeList {
        blocks: Mutex::new(Vec::new()),
    })
}

#[cfg(feature = "parking_lot")]
fn lock(list: &FreeList) -> parking_lot::MutexGuard<'_, Vec<Block>> {
    list.blocks.lock()
}

#[cfg(not(feature = "parking_lot"))]
fn lock(list: &FreeList) -> std::sync::MutexGuard<'_, Vec<Block>> {
    list.blocks.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Takes the smallest free-list block that can satisfy `min_size` bytes
/// with at least `config.min_free()` bytes to spare, or allocates a fresh
/// one sized `max(min_size, config.min_alloc())` from the system.
///
/// Mirrors alloc.c's `new_block`: scan the free list for the first block
/// big enough, unlink it, otherwise `malloc_block`. On a block pulled back
/// off the free list, its dead region's sentinel stamp is verified first
/// (when sentinel-fill debugging is enabled) — a mismatch means something
/// wrote into memory after it was freed.
pub(crate) fn acquire(min_size: usize, config: &AllocatorConfig) -> Block {
    let list = free_list();
    let mut guard = lock(list);

    let slack_needed = min_size + config.min_free();
    if let Some(index) = guard.iter().position(|b| b.capacity() >= slack_needed) {
        let block = guard.swap_remove(index);
        if config.sentinel_fill() && !block.verify_sentinel() {
            crate::fatal::sentinel_mismatch(index);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(capacity = block.capacity(), "reused block from free list");
        return block;
    }
    drop(guard);

    let size = min_size.max(config.min_alloc());
    #[cfg(feature = "tracing")]
    tracing::trace!(size, "allocating fresh block, free list had nothing big enough");
    Block::new(size)
}

/// Returns a chain of blocks to the free list, resetting each one's
/// cursor. If `fill` is set, the dead region is stamped with the sentinel
/// byte so a later `acquire` can detect use-after-free.
///
/// Mirrors alloc.c's `free_blocks`: walk the chain, reset each block, and
/// splice the whole run onto the head of the global free list.
pub(crate) fn release(mut blocks: Vec<Block>, fill: bool) {
    if blocks.is_empty() {
        return;
    }
    for block in blocks.iter() {
        block.reset(fill);
    }

    let list = free_list();
    let mut guard = lock(list);
    guard.append(&mut blocks);
}

/// Total bytes currently held in the free list, across all blocks.
///
/// Mirrors alloc.c's `bytes_in_free_blocks`.
pub(crate) fn bytes_in_free_blocks() -> usize {
    let list = free_list();
    let guard = lock(list);
    guard.iter().map(Block::capacity).sum()
}
