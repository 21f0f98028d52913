/*!
 * Shared helpers for the fork-based integration tests
 */

#![allow(dead_code)]

use nix::unistd::{fork, ForkResult};
use std::time::{Duration, Instant};
use zombie_guard::inventory::ProcScanner;

/// Poll `cond` every 10ms until it holds or `timeout` passes
pub fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut cond: F) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Fork a child outside the launcher that sleeps `delay` then exits with `code`
pub fn fork_exiting(code: i32, delay: Duration) -> i32 {
    match unsafe { fork() }.expect("fork") {
        ForkResult::Child => {
            std::thread::sleep(delay);
            unsafe { nix::libc::_exit(code) }
        }
        ForkResult::Parent { child } => child.as_raw(),
    }
}

/// Whether `pid` is currently a zombie according to procfs
pub fn is_zombie(pid: i32) -> bool {
    ProcScanner::new()
        .stat(pid)
        .map(|stat| stat.is_zombie())
        .unwrap_or(false)
}

/// Wait until every pid in `pids` has terminated but not been reclaimed
pub fn wait_for_zombies(pids: &[i32]) -> bool {
    wait_until(Duration::from_secs(5), || pids.iter().all(|&pid| is_zombie(pid)))
}
