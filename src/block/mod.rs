//! Raw memory blocks — the unit of the process-wide free list.
//!
//! A [`Block`] is a single fixed-alignment heap allocation with a bump
//! cursor (`first_avail`). Blocks are never split and never shrink; they
//! move as whole units between a pool's chain and the shared free list.
//! This mirrors alloc.c's `union block_hdr`, minus the header-in-the-
//! buffer trick (see `DESIGN.md`) — here the cursor lives beside the
//! buffer rather than inside it.

pub(crate) mod store;

use std::alloc::{alloc, dealloc, Layout};
use std::cell::Cell;
use std::ptr::NonNull;

use crate::config::CLICK_SZ;
use crate::fatal;

const SENTINEL_BYTE: u8 = 0xa5;

/// A contiguous, `CLICK_SZ`-aligned region of bytes with a bump cursor.
///
/// `Block` owns its buffer (`alloc`/`dealloc` on drop) and exposes the
/// bump-allocation primitive `palloc` operations are built on. The cursor
/// is a `Cell` rather than requiring `&mut self` so that a pool can bump
/// its active block through a shared reference, matching the rest of the
/// pool's per-field interior mutability.
pub(crate) struct Block {
    ptr: NonNull<u8>,
    capacity: usize,
    first_avail: Cell<usize>,
    /// Whether the dead region currently holds a trustworthy sentinel
    /// stamp. Set by `reset(true)`, cleared by `reset(false)` and by
    /// `new` (freshly allocated memory was never stamped). `bump` never
    /// touches bytes past the new `first_avail`, so the stamp stays valid
    /// for whatever remains dead.
    stamped: Cell<bool>,
}

// SAFETY: `Block` is a self-contained heap allocation. It is only ever
// accessed while the global free list's mutex is held or while owned
// exclusively by a single-threaded `Pool`; no two threads touch the same
// block concurrently.
unsafe impl Send for Block {}

impl Block {
    fn layout(capacity: usize) -> Layout {
        Layout::from_size_align(capacity, CLICK_SZ).expect("block size/alignment overflow")
    }

    /// Allocates a brand new block of at least `capacity` bytes from the
    /// system allocator. Aborts the process on allocation failure, mirroring
    /// alloc.c's `malloc_block`.
    pub(crate) fn new(capacity: usize) -> Block {
        let capacity = capacity.max(CLICK_SZ);
        let layout = Self::layout(capacity);
        // SAFETY: layout has non-zero size (capacity >= CLICK_SZ) and valid alignment.
        let ptr = unsafe { alloc(layout) };
        let ptr = match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => fatal::out_of_memory(capacity),
        };
        Block {
            ptr,
            capacity,
            first_avail: Cell::new(0),
            stamped: Cell::new(false),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn first_avail(&self) -> usize {
        self.first_avail.get()
    }

    #[inline]
    pub(crate) fn avail(&self) -> usize {
        self.capacity - self.first_avail.get()
    }

    /// Bumps the cursor by `size` (already click-rounded) and returns a
    /// pointer to the start of the freshly claimed region. Caller must
    /// ensure `size <= self.avail()`.
    #[inline]
    pub(crate) fn bump(&self, size: usize) -> NonNull<u8> {
        debug_assert!(size <= self.avail(), "bump past block end");
        let offset = self.first_avail.get();
        self.first_avail.set(offset + size);
        // SAFETY: offset is within [0, capacity] by the invariant above.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// The address just past the live region — where the next `bump`
    /// would start writing.
    #[inline]
    pub(crate) fn avail_ptr(&self) -> NonNull<u8> {
        // SAFETY: first_avail is always within [0, capacity].
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(self.first_avail.get())) }
    }

    /// Borrows `len` bytes starting at `offset` as a mutable slice.
    ///
    /// # Safety
    /// Caller must ensure `offset + len <= capacity` and that no other live
    /// borrow aliases the same range.
    #[inline]
    pub(crate) unsafe fn slice_mut(&self, offset: usize, len: usize) -> &mut [u8] {
        debug_assert!(offset + len <= self.capacity);
        std::slice::from_raw_parts_mut(self.ptr.as_ptr().add(offset), len)
    }

    /// Borrows the live (allocated, below `first_avail`) region of the
    /// block, read-only.
    #[inline]
    pub(crate) fn live_slice(&self) -> &[u8] {
        // SAFETY: [0, first_avail) has always been returned by `bump` and
        // is therefore initialized by the caller that wrote into it.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.first_avail.get()) }
    }

    /// Resets the cursor to the start of the buffer and, if `fill`, stamps
    /// the dead region with the sentinel byte for use-after-free detection.
    pub(crate) fn reset(&self, fill: bool) {
        self.first_avail.set(0);
        if fill {
            // SAFETY: the whole buffer is dead once the cursor is reset.
            unsafe {
                std::ptr::write_bytes(self.ptr.as_ptr(), SENTINEL_BYTE, self.capacity);
            }
        }
        self.stamped.set(fill);
    }

    /// Verifies the dead region (`first_avail..capacity`) is still
    /// sentinel-filled. A mismatch means something wrote past its
    /// allocation or used memory after it was freed. Vacuously passes if
    /// the block was never stamped (nothing to verify against).
    pub(crate) fn verify_sentinel(&self) -> bool {
        if !self.stamped.get() {
            return true;
        }
        let offset = self.first_avail.get();
        // SAFETY: [offset, capacity) is always a valid sub-range of the buffer.
        let dead = unsafe {
            std::slice::from_raw_parts(self.ptr.as_ptr().add(offset), self.capacity - offset)
        };
        dead.iter().all(|&b| b == SENTINEL_BYTE)
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `layout` matches the one used in `new`; `ptr` was
        // allocated by that same call and hasn't been freed yet.
        unsafe { dealloc(self.ptr.as_ptr(), Self::layout(self.capacity)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_is_click_aligned_and_empty() {
        let block = Block::new(100);
        assert_eq!(block.first_avail(), 0);
        assert!(block.capacity() >= 100);
        assert_eq!(block.avail(), block.capacity());
    }

    #[test]
    fn bump_advances_cursor_and_returns_distinct_pointers() {
        let block = Block::new(1024);
        let a = block.bump(CLICK_SZ);
        let b = block.bump(CLICK_SZ);
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(block.first_avail(), CLICK_SZ * 2);
    }

    #[test]
    fn reset_with_fill_stamps_sentinel_and_verifies() {
        let block = Block::new(64);
        block.bump(16);
        block.reset(true);
        assert_eq!(block.first_avail(), 0);
        assert!(block.verify_sentinel());
    }

    #[test]
    fn reset_without_fill_does_not_touch_bytes() {
        let block = Block::new(64);
        block.bump(16);
        block.reset(false);
        // Dead region wasn't stamped, so verification isn't guaranteed —
        // but the cursor must still have moved back to zero.
        assert_eq!(block.first_avail(), 0);
    }

    #[test]
    fn live_slice_reflects_bumped_region() {
        let block = Block::new(64);
        unsafe {
            let dst = block.bump(4);
            std::ptr::copy_nonoverlapping(b"ABCD".as_ptr(), dst.as_ptr(), 4);
        }
        assert_eq!(block.live_slice(), b"ABCD");
    }
}
