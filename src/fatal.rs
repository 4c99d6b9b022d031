//! Unrecoverable-corruption handling.
//!
//! Spec error taxonomy draws a hard line: resource-wrapper failures are
//! recoverable ([`crate::error::Error`]), but anything that indicates the
//! allocator's own bookkeeping is broken — out-of-memory, a sentinel byte
//! that's been overwritten, a double free, a dangling pool reference — is
//! not. A long-running server cannot keep serving requests once any of
//! those are true, so the only sane move is the one the C original made:
//! print a diagnostic and abort.

/// Aborts the process after logging `message` at error level.
///
/// Mirrors alloc.c's `fprintf(stderr, ...); abort();` pairing used by
/// `malloc_block` on OOM and `debug_verify_filled` on sentinel mismatch.
#[cold]
#[inline(never)]
pub(crate) fn abort_with(message: &str) -> ! {
    #[cfg(feature = "tracing")]
    tracing::error!(%message, "arenapool: fatal corruption, aborting");
    #[cfg(not(feature = "tracing"))]
    eprintln!("arenapool: fatal: {message}");

    std::process::abort()
}

/// Aborts with a message built from the sentinel-mismatch scenario.
#[cold]
#[inline(never)]
pub(crate) fn sentinel_mismatch(block_index: usize) -> ! {
    abort_with(&format!(
        "block {block_index} on the free list failed sentinel verification \
         (used after free)"
    ))
}

/// Aborts when the system allocator itself fails to produce a new block.
#[cold]
#[inline(never)]
pub(crate) fn out_of_memory(requested: usize) -> ! {
    abort_with(&format!(
        "system allocation of {requested} bytes failed; cannot continue"
    ))
}

/// Aborts when `track_pool_ownership` debug mode catches a container
/// being copied or overlaid into a pool unrelated to its own.
#[cold]
#[inline(never)]
pub(crate) fn pool_ownership_violation() -> ! {
    abort_with(
        "pool ownership violation: destination pool is not this object's \
         own pool, ancestor, or descendant",
    )
}
