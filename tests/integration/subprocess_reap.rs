//! Subprocess spawning and reap-on-destroy behavior.

use std::time::Duration;

use arenapool::config::AllocatorConfig;
use arenapool::pool::Pool;
use arenapool::subprocess::{spawn_child, KillPolicy};

#[test]
fn destroying_a_pool_reaps_children_tracked_with_kill_always() {
    let config = AllocatorConfig::builder()
        .subprocess_grace_period_secs(0)
        .build()
        .unwrap();
    let pool = Pool::new(config);

    let child = spawn_child(&pool, KillPolicy::Always, || unsafe {
        libc::pause();
        libc::_exit(0);
    })
    .expect("fork should succeed in a test process");
    let pid = child.pid();

    pool.destroy();

    // The process is gone: waitpid would now fail with ECHILD (already
    // reaped) rather than returning "still running".
    let mut status: libc::c_int = 0;
    let result = unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) };
    assert_eq!(result, -1);
}

#[test]
fn a_child_that_exits_on_its_own_is_picked_up_without_signaling() {
    let pool = Pool::new(AllocatorConfig::default());

    let child = spawn_child(&pool, KillPolicy::Never, || unsafe { libc::_exit(0) })
        .expect("fork should succeed in a test process");
    let pid = child.pid();

    // Give the child a moment to exit before the pool's non-blocking pass.
    std::thread::sleep(Duration::from_millis(50));
    pool.destroy();

    let mut status: libc::c_int = 0;
    let result = unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) };
    assert_eq!(result, -1);
}

#[test]
fn stdio_pipes_carry_data_between_parent_and_child() {
    use std::io::{Read, Write};

    let pool = Pool::new(AllocatorConfig::default());
    let mut child = spawn_child(&pool, KillPolicy::Always, || unsafe {
        let mut buf = [0u8; 5];
        libc::read(libc::STDIN_FILENO, buf.as_mut_ptr() as *mut _, buf.len());
        libc::write(libc::STDOUT_FILENO, buf.as_ptr() as *const _, buf.len());
        libc::_exit(0);
    })
    .expect("fork should succeed in a test process");

    child.stdin().write_all(b"hello").unwrap();
    let mut out = [0u8; 5];
    child.stdout().read_exact(&mut out).unwrap();
    assert_eq!(&out, b"hello");

    pool.destroy();
}
