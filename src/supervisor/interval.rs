/*!
 * Interval Wait
 *
 * A pause between supervisor iterations that signal delivery can cut short.
 * `std::thread::sleep` silently resumes after EINTR, so the wait talks to
 * `nanosleep` directly and hands the unslept remainder back to the caller.
 *
 * `wait_interval` checks for cancellation only after an interruption; a
 * signal landing between that check and the next sleep is noticed at the
 * next interruption or when the interval runs out.
 * `wait_interval_guarded` closes that window for a chosen signal set: those
 * signals stay blocked while the thread is awake and are unblocked
 * atomically by `ppoll` for the duration of each sleep.
 */

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{SigSet, SigmaskHow};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::warn;

/// Result of a single `nanosleep`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Completed,
    Interrupted { remaining: Duration },
}

/// Sleep once; a delivered signal ends the sleep early
pub fn sleep_interruptible(duration: Duration) -> SleepOutcome {
    if duration.is_zero() {
        return SleepOutcome::Completed;
    }

    let request = libc::timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };
    let mut remaining = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };

    // SAFETY: both pointers reference live, initialized timespecs
    let rc = unsafe { libc::nanosleep(&request, &mut remaining) };
    if rc == 0 {
        return SleepOutcome::Completed;
    }

    match Errno::last() {
        Errno::EINTR => {
            let remaining = Duration::new(remaining.tv_sec as u64, remaining.tv_nsec as u32);
            if remaining.is_zero() {
                SleepOutcome::Completed
            } else {
                SleepOutcome::Interrupted { remaining }
            }
        }
        // EINVAL/EFAULT cannot happen with the values built above
        _ => SleepOutcome::Completed,
    }
}

/// How a full interval wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The whole interval elapsed
    Elapsed { interruptions: u32 },
    /// The interrupt callback asked to stop waiting
    Cancelled {
        remaining: Duration,
        interruptions: u32,
    },
}

impl WaitOutcome {
    pub fn interruptions(&self) -> u32 {
        match *self {
            WaitOutcome::Elapsed { interruptions } => interruptions,
            WaitOutcome::Cancelled { interruptions, .. } => interruptions,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled { .. })
    }
}

/// Wait out `total`, resuming with the remainder after every interruption
///
/// `on_interrupt` runs in ordinary control flow after each interruption with
/// the time still to wait; returning `ControlFlow::Break` abandons the wait.
pub fn wait_interval<F>(total: Duration, mut on_interrupt: F) -> WaitOutcome
where
    F: FnMut(Duration) -> ControlFlow<()>,
{
    let mut remaining = total;
    let mut interruptions = 0u32;

    loop {
        match sleep_interruptible(remaining) {
            SleepOutcome::Completed => return WaitOutcome::Elapsed { interruptions },
            SleepOutcome::Interrupted { remaining: left } => {
                interruptions += 1;
                remaining = left;
                if on_interrupt(remaining).is_break() {
                    return WaitOutcome::Cancelled {
                        remaining,
                        interruptions,
                    };
                }
            }
        }
    }
}

/// Wait out `total` without missing any of the `guarded` signals
///
/// `keep_waiting` runs before every sleep, the first one included, with the
/// guarded signals blocked. A guarded signal raised while it runs (or while
/// the caller was busy before the wait) is still pending when the sleep
/// starts, so that sleep returns at once and `keep_waiting` runs again.
/// The caller's signal mask is restored on return.
pub fn wait_interval_guarded<F>(
    total: Duration,
    guarded: &SigSet,
    keep_waiting: F,
) -> WaitOutcome
where
    F: FnMut(Duration) -> ControlFlow<()>,
{
    let awake_mask = match guarded.thread_swap_mask(SigmaskHow::SIG_BLOCK) {
        Ok(previous) => previous,
        Err(errno) => {
            warn!(%errno, "Could not block guarded signals, waiting unguarded");
            return unguarded(total, keep_waiting);
        }
    };

    let outcome = guarded_loop(total, &awake_mask, keep_waiting);

    if let Err(errno) = awake_mask.thread_set_mask() {
        warn!(%errno, "Could not restore signal mask after interval wait");
    }
    outcome
}

/// Fallback that still consults `keep_waiting` once before sleeping
fn unguarded<F>(total: Duration, mut keep_waiting: F) -> WaitOutcome
where
    F: FnMut(Duration) -> ControlFlow<()>,
{
    if keep_waiting(total).is_break() {
        return WaitOutcome::Cancelled {
            remaining: total,
            interruptions: 0,
        };
    }
    wait_interval(total, keep_waiting)
}

fn guarded_loop<F>(
    total: Duration,
    sleep_mask: &SigSet,
    mut keep_waiting: F,
) -> WaitOutcome
where
    F: FnMut(Duration) -> ControlFlow<()>,
{
    let deadline = Instant::now() + total;
    let mut interruptions = 0u32;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return WaitOutcome::Elapsed { interruptions };
        }
        if keep_waiting(remaining).is_break() {
            return WaitOutcome::Cancelled {
                remaining,
                interruptions,
            };
        }
        if let SleepOutcome::Interrupted { .. } = sleep_with_mask(remaining, sleep_mask) {
            interruptions += 1;
        }
    }
}

/// Sleep with `mask` installed for exactly the duration of the sleep
#[cfg(any(target_os = "linux", target_os = "android"))]
fn sleep_with_mask(duration: Duration, mask: &SigSet) -> SleepOutcome {
    let started = Instant::now();
    let timeout = libc::timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };
    let sigset: &libc::sigset_t = mask.as_ref();

    // SAFETY: no descriptors are polled; timeout and sigset are live for the call
    let rc = unsafe { libc::ppoll(std::ptr::null_mut(), 0, &timeout, sigset) };
    if rc >= 0 || Errno::last() != Errno::EINTR {
        return SleepOutcome::Completed;
    }

    let remaining = duration.saturating_sub(started.elapsed());
    if remaining.is_zero() {
        SleepOutcome::Completed
    } else {
        SleepOutcome::Interrupted { remaining }
    }
}

/// Without `ppoll` the mask is swapped around a plain sleep
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn sleep_with_mask(duration: Duration, mask: &SigSet) -> SleepOutcome {
    let awake = match mask.thread_swap_mask(SigmaskHow::SIG_SETMASK) {
        Ok(awake) => awake,
        Err(_) => return sleep_interruptible(duration),
    };
    let outcome = sleep_interruptible(duration);
    let _ = awake.thread_set_mask();
    outcome
}
