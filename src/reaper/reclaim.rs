/*!
 * Exit Status Reclaimer
 *
 * Drains every terminated child without blocking. One SIGCHLD may stand for
 * several terminations, so a single `waitpid` per notification would leave
 * zombies behind; the reclaimer keeps asking until the kernel reports that
 * nothing is left to collect.
 */

use super::journal::ReapJournal;
use super::stats::StatsRegistry;
use crate::core::types::{ExitDisposition, ReapedChild};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};

/// Lazy, finite sequence of reclaimed children
///
/// Each `next()` performs one non-blocking `waitpid(-1, WNOHANG)`. The
/// sequence ends when no terminated child remains or no child exists at all
/// (`ECHILD` is not an error here).
///
/// # Signal safety
/// Uses only `waitpid`; no allocation, no locks.
#[derive(Debug, Default)]
pub struct Reclaimer {
    exhausted: bool,
}

impl Reclaimer {
    pub fn new() -> Self {
        Self { exhausted: false }
    }
}

impl Iterator for Reclaimer {
    type Item = ReapedChild;

    fn next(&mut self) -> Option<ReapedChild> {
        if self.exhausted {
            return None;
        }

        loop {
            match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, code)) => {
                    return Some(ReapedChild::new(
                        pid.as_raw(),
                        ExitDisposition::Exited { code },
                    ));
                }
                Ok(WaitStatus::Signaled(pid, signal, core_dumped)) => {
                    return Some(ReapedChild::new(
                        pid.as_raw(),
                        ExitDisposition::Signaled {
                            signal: signal as i32,
                            core_dumped,
                        },
                    ));
                }
                // Still-running children, or no children at all
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Err(Errno::EINTR) => continue,
                // Stop/continue reports are not terminations
                Ok(_) => continue,
                Err(_) => break,
            }
        }

        self.exhausted = true;
        None
    }
}

/// Reclaim every terminated child
pub fn reclaim_all() -> Reclaimer {
    Reclaimer::new()
}

/// Reclaim every terminated child and account for it
///
/// This is the body of the SIGCHLD handler. It records each reclaimed child
/// in `journal` for deferred logging and adds the total to `stats` once.
/// Returns the number of children reclaimed.
pub fn reap_terminated<const N: usize>(stats: &StatsRegistry, journal: &ReapJournal<N>) -> u64 {
    let mut reclaimed = 0u64;
    for child in reclaim_all() {
        journal.record(child);
        reclaimed += 1;
    }
    stats.record_reaped(reclaimed);
    reclaimed
}
