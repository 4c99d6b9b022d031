//! Interruption-blocking scope.
//!
//! Pool surgery (re-linking a block chain during `clear_pool`, walking the
//! cleanup list during `destroy_pool`) must not be interrupted halfway by
//! something that turns around and allocates from the same pool. alloc.c
//! calls this `block_alarms`/`unblock_alarms`, implemented with real signal
//! masking. This crate has no signal layer of its own (out of scope), so
//! the scope is reified as a thread-local reentrant nesting counter: as
//! long as any guard is alive on the current thread, the thread is
//! considered "blocked", and callers that need to know can check
//! [`is_blocked`].

use std::cell::Cell;

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// RAII guard marking a thread as inside an interruption-blocked scope.
///
/// Nesting is supported: a second guard created while the first is still
/// alive simply increments the depth counter, and the scope only ends once
/// every guard on the current thread has been dropped.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct InterruptGuard {
    _private: (),
}

impl InterruptGuard {
    /// Enters (or re-enters) the interruption-blocked scope on this thread.
    pub fn enter() -> InterruptGuard {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        InterruptGuard { _private: () }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| {
            let current = depth.get();
            debug_assert!(current > 0, "InterruptGuard dropped more times than entered");
            depth.set(current.saturating_sub(1));
        });
    }
}

/// Whether the current thread is currently inside a blocked scope.
pub fn is_blocked() -> bool {
    DEPTH.with(|depth| depth.get() > 0)
}
