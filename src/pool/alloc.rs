//! Bump-path allocation: `palloc`, `pcalloc`, `pstrdup`, `pstrndup`, `pstrcat`.

use crate::block;
use crate::config::round_to_clicks;

use super::inner::PoolInner;

impl PoolInner {
    /// Hands out `size` fresh bytes from the active block, growing the
    /// chain with a block from the free list (or the system allocator) if
    /// the active block doesn't have room. `size` must be nonzero.
    ///
    /// In `malloc_per_allocation` debug mode, every call acquires a block
    /// sized exactly to this request instead of packing into the active
    /// one, so each allocation gets its own dedicated backing memory —
    /// the shape external memory checkers (ASan-style tools watching the
    /// system allocator) need to attribute a use-after-free to the right
    /// allocation instead of to a whole shared block.
    ///
    /// Mirrors alloc.c's `palloc`.
    pub(super) fn alloc_raw(&self, size: usize) -> &mut [u8] {
        let rounded = round_to_clicks(size);
        let mut blocks = self.blocks.borrow_mut();

        let needs_new_block = if self.config.malloc_per_allocation() {
            true
        } else {
            match blocks.last() {
                Some(last) => last.avail() < rounded,
                None => true,
            }
        };

        if needs_new_block {
            let block = block::store::acquire(rounded, &self.config);
            blocks.push(block);
        }

        let active = blocks.last().expect("a block was just ensured to exist");
        let start = active.bump(rounded);
        // SAFETY: `start` is a fresh, non-aliased region of at least
        // `rounded >= size` bytes just carved out of `active`'s buffer.
        // The buffer's address is stable regardless of `blocks` (the Vec)
        // reallocating, since each `Block` owns its storage independently.
        unsafe { std::slice::from_raw_parts_mut(start.as_ptr(), size) }
    }
}

/// Public allocation API, implemented on the [`super::Pool`] handle.
///
/// # Aliasing and lifetime hazard
///
/// Every method here returns a reference that borrows only `&self`, not
/// `&mut self` — so nothing in the type system stops the pool from being
/// [cleared](super::Pool::clear) or [destroyed](super::Pool::destroy)
/// (also `&self`) while such a reference is still alive. Both of those
/// calls physically reuse or sentinel-stamp the exact memory a prior
/// `alloc`/`calloc`/`strdup`/`strndup`/`strcat`/[`super::Pool::format`]
/// call returned a reference into. Safe-looking code like:
///
/// ```ignore
/// let s = pool.strdup("x");
/// pool.clear();
/// println!("{s}"); // reads memory already reused/stamped by clear()
/// ```
///
/// compiles without `unsafe` but reads invalidated memory. This mirrors
/// alloc.c's own contract (nothing stops a caller from holding a `char *`
/// past `clear_pool`/`destroy_pool` there either) rather than fixing it at
/// the type level, which would require tying every returned reference's
/// lifetime to a `&mut` borrow of the pool — incompatible with a pool
/// handing out many concurrent allocations from a shared `&self`. Callers
/// must not read through a reference returned by this `impl` block after
/// calling `clear`/`destroy` on the pool (or any ancestor of it) that
/// produced it.
impl super::Pool {
    /// Allocates `size` bytes from the pool. Returns
    /// [`Error::NonPositiveSize`](crate::error::Error::NonPositiveSize) if
    /// `size` isn't positive, matching alloc.c's `palloc` contract (a
    /// negative or zero request is a caller bug, not an OOM condition).
    ///
    /// The returned slice is uninitialized; use [`Pool::calloc`] for
    /// zero-filled memory. See this `impl` block's documentation for the
    /// aliasing/lifetime contract the returned slice is subject to.
    pub fn alloc(&self, size: isize) -> crate::error::Result<&mut [u8]> {
        if size <= 0 {
            return Err(crate::error::Error::NonPositiveSize { requested: size });
        }
        Ok(self.inner().alloc_raw(size as usize))
    }

    /// Like [`Pool::alloc`], but the returned memory is zero-filled.
    ///
    /// Mirrors alloc.c's `pcalloc`.
    pub fn calloc(&self, size: isize) -> crate::error::Result<&mut [u8]> {
        let buf = self.alloc(size)?;
        buf.fill(0);
        Ok(buf)
    }

    /// Copies `s` into pool-owned memory and returns a pool-lifetime view
    /// of it.
    ///
    /// Mirrors alloc.c's `pstrdup`.
    pub fn strdup(&self, s: &str) -> &str {
        let bytes = s.as_bytes();
        let buf = self.inner().alloc_raw(bytes.len() + 1);
        buf[..bytes.len()].copy_from_slice(bytes);
        buf[bytes.len()] = 0;
        // SAFETY: the copied region is exactly `s`'s bytes.
        unsafe { std::str::from_utf8_unchecked(&buf[..bytes.len()]) }
    }

    /// Like [`Pool::strdup`], but truncates to at most `n` bytes (rounded
    /// down to the nearest character boundary, since unlike alloc.c's
    /// `pstrndup` this returns a `&str`, not a raw byte buffer).
    ///
    /// Mirrors alloc.c's `pstrndup`.
    pub fn strndup(&self, s: &str, n: usize) -> &str {
        let mut end = n.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        self.strdup(&s[..end])
    }

    /// Concatenates `parts` into one pool-owned string.
    ///
    /// Mirrors alloc.c's `pstrcat`, minus the NULL-terminated-varargs
    /// calling convention — callers pass a slice instead.
    pub fn strcat(&self, parts: &[&str]) -> &str {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        let buf = self.inner().alloc_raw(total + 1);
        let mut offset = 0;
        for part in parts {
            let bytes = part.as_bytes();
            buf[offset..offset + bytes.len()].copy_from_slice(bytes);
            offset += bytes.len();
        }
        buf[total] = 0;
        // SAFETY: the copied region is the concatenation of valid `&str`s.
        unsafe { std::str::from_utf8_unchecked(&buf[..total]) }
    }
}
