//! `free_proc_chain`'s three-phase reap.

use crate::config::AllocatorConfig;

use super::{KillPolicy, ProcessChain};

impl ProcessChain {
    /// Reaps every tracked subprocess, applying each one's kill policy.
    ///
    /// Three phases, matching alloc.c's `free_proc_chain`:
    ///
    /// 1. A non-blocking pass (`waitpid(WNOHANG)`) picks up anything that
    ///    already exited on its own.
    /// 2. Survivors are signaled according to policy: `Always` gets
    ///    `SIGKILL` immediately; `AfterTimeout` and `OnlyOnce` get
    ///    `SIGTERM`. Both of those count toward whether a grace period is
    ///    owed — if either one actually sent a signal this phase, the
    ///    whole batch sleeps once for the configured grace period, not
    ///    once per process.
    /// 3. Survivors still tracked as `AfterTimeout` get `SIGKILL`, and
    ///    everything that was signaled gets a final blocking `waitpid`.
    pub(crate) fn reap_on_clear(&mut self, config: &AllocatorConfig) {
        // Phase 1: pick up anything that already exited.
        for entry in self.entries.iter_mut().filter(|e| !e.reaped) {
            if wait_nonblocking(entry.pid) {
                entry.reaped = true;
            }
        }

        // Phase 2: signal survivors; track whether a grace period is owed.
        let mut any_signaled_this_pass = false;
        for entry in self.entries.iter_mut().filter(|e| !e.reaped) {
            match entry.policy {
                KillPolicy::Never => {}
                KillPolicy::Always => {
                    send_signal(entry.pid, libc::SIGKILL);
                    entry.signaled = true;
                }
                KillPolicy::AfterTimeout => {
                    send_signal(entry.pid, libc::SIGTERM);
                    entry.signaled = true;
                    any_signaled_this_pass = true;
                }
                KillPolicy::OnlyOnce => {
                    if !entry.signaled {
                        send_signal(entry.pid, libc::SIGTERM);
                        entry.signaled = true;
                        any_signaled_this_pass = true;
                    }
                }
            }
        }

        if any_signaled_this_pass {
            std::thread::sleep(config.subprocess_grace_period());
        }

        // Phase 3: anything given a grace period that's still alive gets
        // killed outright, then every signaled process is waited on.
        for entry in self.entries.iter_mut().filter(|e| !e.reaped) {
            if entry.policy == KillPolicy::AfterTimeout {
                if wait_nonblocking(entry.pid) {
                    entry.reaped = true;
                    continue;
                }
                send_signal(entry.pid, libc::SIGKILL);
            }
        }
        for entry in self.entries.iter_mut().filter(|e| e.signaled && !e.reaped) {
            wait_blocking(entry.pid);
            entry.reaped = true;
        }

        self.entries.retain(|e| !e.reaped);
    }
}

fn send_signal(pid: libc::pid_t, signal: libc::c_int) {
    // SAFETY: `kill` with a plain pid and signal number has no memory
    // preconditions; failure (already exited) is reported via errno and
    // ignored here, matching alloc.c's best-effort signaling.
    unsafe {
        libc::kill(pid, signal);
    }
}

fn wait_nonblocking(pid: libc::pid_t) -> bool {
    let mut status: libc::c_int = 0;
    // SAFETY: `status` is a valid out-pointer for `waitpid`.
    let result = unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) };
    result == pid
}

fn wait_blocking(pid: libc::pid_t) {
    let mut status: libc::c_int = 0;
    // SAFETY: `status` is a valid out-pointer for `waitpid`.
    unsafe {
        libc::waitpid(pid, &mut status, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AllocatorConfig {
        AllocatorConfig::builder()
            .subprocess_grace_period_secs(0)
            .build()
            .unwrap()
    }

    #[test]
    fn reap_collects_an_already_exited_child() {
        // SAFETY: fork() with an immediate _exit in the child is safe in a
        // single-threaded test process.
        let pid = unsafe { libc::fork() };
        if pid == 0 {
            unsafe { libc::_exit(0) };
        }
        // Give the child a moment to exit before the non-blocking pass.
        std::thread::sleep(std::time::Duration::from_millis(50));

        let mut chain = ProcessChain::default();
        chain.note(pid, KillPolicy::Never);
        chain.reap_on_clear(&config());
        assert!(chain.entries.is_empty());
    }

    #[test]
    fn kill_always_terminates_a_long_running_child() {
        // SAFETY: fork() with an immediate pause/exit in the child is safe
        // in a single-threaded test process.
        let pid = unsafe { libc::fork() };
        if pid == 0 {
            unsafe {
                libc::pause();
                libc::_exit(0);
            }
        }

        let mut chain = ProcessChain::default();
        chain.note(pid, KillPolicy::Always);
        chain.reap_on_clear(&config());
        assert!(chain.entries.is_empty());
    }
}
