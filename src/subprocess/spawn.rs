//! Forking a child process with piped stdio, and tracking it for reap.
//!
//! Mirrors alloc.c's `spawn_child_err_core` and its two thin wrappers
//! `spawn_child_err` (raw descriptors) and `spawn_child_err_buff`
//! (buffered streams). The generic core forks, wires up pipes for the
//! child's stdin/stdout, and runs a caller-supplied closure in the child
//! before it's expected to either `exec` or `_exit`.

use std::fs::File;
use std::io;
use std::os::unix::io::{FromRawFd, RawFd};

use crate::pool::Pool;

use super::KillPolicy;

/// A subprocess spawned through [`spawn_child`] or one of its buffered
/// variants, along with pipes wired to its stdin/stdout.
pub struct SpawnedChild {
    pid: libc::pid_t,
    stdin: File,
    stdout: File,
}

impl SpawnedChild {
    /// The child's process id.
    pub fn pid(&self) -> libc::pid_t {
        self.pid
    }

    /// A writable end of a pipe connected to the child's stdin.
    pub fn stdin(&mut self) -> &mut File {
        &mut self.stdin
    }

    /// A readable end of a pipe connected to the child's stdout.
    pub fn stdout(&mut self) -> &mut File {
        &mut self.stdout
    }

    /// Splits this handle into its raw stdin/stdout streams, consuming it.
    pub fn into_streams(self) -> (File, File) {
        (self.stdin, self.stdout)
    }
}

fn pipe2() -> io::Result<(RawFd, RawFd)> {
    let mut fds = [0 as RawFd; 2];
    // SAFETY: `fds` is a valid 2-element out-array for `pipe`.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok((fds[0], fds[1]))
}

fn dup2_or_die(old: RawFd, new: RawFd) {
    // SAFETY: plain fd duplication; failure aborts the child below.
    if unsafe { libc::dup2(old, new) } < 0 {
        // SAFETY: _exit is async-signal-safe and appropriate post-fork,
        // pre-exec, when something in setup has already gone wrong.
        unsafe { libc::_exit(127) };
    }
}

/// Forks a child process with its stdin/stdout wired to pipes back to the
/// parent, runs `in_child` in the child (expected to `exec` or `_exit`
/// itself), and registers the subprocess with `pool` so it's reaped
/// according to `policy` when the pool is cleared or destroyed.
///
/// Mirrors alloc.c's `spawn_child_err_core`.
pub fn spawn_child(
    pool: &Pool,
    policy: KillPolicy,
    in_child: impl FnOnce() -> !,
) -> crate::error::Result<SpawnedChild> {
    let (child_stdin_r, parent_stdin_w) = pipe2()?;
    let (parent_stdout_r, child_stdout_w) = pipe2()?;

    // SAFETY: fork() is safe to call; the child side only touches
    // async-signal-safe APIs (dup2, close, and the caller's `in_child`,
    // which is documented to behave the same way) before exec/_exit.
    let pid = unsafe { libc::fork() };
    match pid {
        -1 => {
            for fd in [child_stdin_r, parent_stdin_w, parent_stdout_r, child_stdout_w] {
                unsafe { libc::close(fd) };
            }
            Err(crate::error::Error::from_errno())
        }
        0 => {
            unsafe {
                libc::close(parent_stdin_w);
                libc::close(parent_stdout_r);
            }
            dup2_or_die(child_stdin_r, libc::STDIN_FILENO);
            dup2_or_die(child_stdout_w, libc::STDOUT_FILENO);
            unsafe {
                libc::close(child_stdin_r);
                libc::close(child_stdout_w);
                // The child must not inherit the parent's SIGCHLD
                // disposition (e.g. SIG_IGN, or a handler reaping this
                // process's own children) before running caller code.
                libc::signal(libc::SIGCHLD, libc::SIG_DFL);
            }
            in_child();
        }
        _ => {
            unsafe {
                libc::close(child_stdin_r);
                libc::close(child_stdout_w);
            }
            pool.subprocesses().borrow_mut().note(pid, policy);
            // SAFETY: `parent_stdin_w`/`parent_stdout_r` are open fds this
            // process owns exclusively from this point on.
            let stdin = unsafe { File::from_raw_fd(parent_stdin_w) };
            let stdout = unsafe { File::from_raw_fd(parent_stdout_r) };
            Ok(SpawnedChild { pid, stdin, stdout })
        }
    }
}

/// Like [`spawn_child`], but wraps the child's pipes in buffered readers
/// and writers, matching alloc.c's `spawn_child_err_buff`.
pub fn spawn_child_buffered(
    pool: &Pool,
    policy: KillPolicy,
    in_child: impl FnOnce() -> !,
) -> crate::error::Result<(io::BufWriter<File>, io::BufReader<File>, libc::pid_t)> {
    let child = spawn_child(pool, policy, in_child)?;
    let pid = child.pid();
    let (stdin, stdout) = child.into_streams();
    Ok((io::BufWriter::new(stdin), io::BufReader::new(stdout), pid))
}
