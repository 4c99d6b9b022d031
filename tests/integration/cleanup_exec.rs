//! `prepare_for_exec` runs every on_exec half across a pool and its
//! descendants, then clears the cleanup lists entirely — a later
//! `clear`/`destroy` does not also run on_destroy for anything that
//! already ran on_exec.

use std::cell::RefCell;
use std::rc::Rc;

use arenapool::config::AllocatorConfig;
use arenapool::pool::Pool;
use arenapool::resource::PoolDescriptor;

fn make_pipe() -> (std::os::unix::io::RawFd, std::os::unix::io::RawFd) {
    let mut fds = [0; 2];
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
    (fds[0], fds[1])
}

fn fd_is_open(fd: std::os::unix::io::RawFd) -> bool {
    unsafe { libc::fcntl(fd, libc::F_GETFD) != -1 }
}

#[test]
fn prepare_for_exec_runs_on_exec_and_clears_the_cleanup_list() {
    let pool = Pool::new(AllocatorConfig::default());
    let destroy_ran = Rc::new(RefCell::new(false));
    let exec_ran = Rc::new(RefCell::new(false));

    let d = Rc::clone(&destroy_ran);
    let e = Rc::clone(&exec_ran);
    pool.register_cleanup(
        move || *d.borrow_mut() = true,
        Some(Box::new(move || *e.borrow_mut() = true)),
    );

    pool.prepare_for_exec();

    assert!(*exec_ran.borrow());
    assert!(!*destroy_ran.borrow());

    // Invariant 9: cleanup_for_exec clears the cleanup list, so a later
    // destroy does not also run the on_destroy half.
    pool.destroy();
    assert!(!*destroy_ran.borrow());
}

#[test]
fn prepare_for_exec_recurses_into_child_pools() {
    let parent = Pool::new(AllocatorConfig::default());
    let child = parent.make_sub_pool();
    let exec_ran = Rc::new(RefCell::new(false));

    let e = Rc::clone(&exec_ran);
    child.register_cleanup(|| {}, Some(Box::new(move || *e.borrow_mut() = true)));

    parent.prepare_for_exec();
    assert!(*exec_ran.borrow());
}

#[test]
fn pool_descriptor_closes_on_exec_via_its_on_exec_half() {
    let pool = Pool::new(AllocatorConfig::default());
    let (read_fd, write_fd) = make_pipe();

    let descriptor = PoolDescriptor::adopt(&pool, read_fd);
    assert!(fd_is_open(descriptor.as_raw_fd()));

    pool.prepare_for_exec();
    assert!(!fd_is_open(read_fd));

    // on_exec already removed this cleanup from the pool's list, so
    // destroying the pool afterward must not attempt to close the fd a
    // second time or panic.
    pool.destroy();

    unsafe { libc::close(write_fd) };
}

#[test]
fn closing_a_resource_explicitly_prevents_its_cleanup_from_running_twice() {
    let pool = Pool::new(AllocatorConfig::default());
    let (read_fd, write_fd) = make_pipe();

    let descriptor = PoolDescriptor::adopt(&pool, read_fd);
    descriptor.close(&pool).unwrap();
    assert!(!fd_is_open(read_fd));

    // Destroying the pool afterward must not double-close `read_fd`.
    pool.destroy();

    unsafe { libc::close(write_fd) };
}
