//! Subprocess lifecycle: tracking children a pool spawned and reaping them
//! when the pool is cleared or destroyed.

mod reap;
mod spawn;

pub use spawn::{spawn_child, spawn_child_buffered, SpawnedChild};

/// How a tracked subprocess should be treated when its owning pool is
/// cleared or destroyed.
///
/// Mirrors alloc.c's `kill_conditions` (`kill_never`, `kill_always`,
/// `kill_after_timeout`, `kill_only_once`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillPolicy {
    /// Never signaled; only reaped if it happens to have already exited.
    Never,
    /// Sent `SIGKILL` immediately on reap, no grace period.
    Always,
    /// Sent `SIGTERM`, given one grace period to exit, then `SIGKILL`.
    AfterTimeout,
    /// Sent `SIGTERM` exactly once, ever; never force-killed afterward.
    OnlyOnce,
}

pub(crate) struct ProcessEntry {
    pid: libc::pid_t,
    policy: KillPolicy,
    reaped: bool,
    signaled: bool,
}

/// The set of subprocesses a single pool is responsible for reaping.
///
/// Mirrors alloc.c's per-pool `subprocesses` linked list plus
/// `free_proc_chain`'s reap algorithm.
pub(crate) struct ProcessChain {
    entries: Vec<ProcessEntry>,
}

impl Default for ProcessChain {
    fn default() -> Self {
        ProcessChain {
            entries: Vec::new(),
        }
    }
}

impl ProcessChain {
    /// Starts tracking a subprocess with the given kill policy.
    ///
    /// Mirrors alloc.c's `note_subprocess`.
    pub(crate) fn note(&mut self, pid: libc::pid_t, policy: KillPolicy) {
        self.entries.push(ProcessEntry {
            pid,
            policy,
            reaped: false,
            signaled: false,
        });
    }
}
