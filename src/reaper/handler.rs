/*!
 * SIGCHLD Notification Handler
 *
 * Installs the process-wide handler that reclaims terminated children the
 * moment the kernel reports them. The handler only drains, counts and
 * journals; log lines are produced later by the supervisor loop.
 */

use super::journal::{JournalReader, ReapJournal};
use super::reclaim::reap_terminated;
use super::stats::{ChildStats, StatsRegistry};
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::REAP_JOURNAL_CAPACITY;
use nix::errno::Errno;
use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Journal type used by the process-wide handler
pub type ProcessJournal = ReapJournal<REAP_JOURNAL_CAPACITY>;

static STATS: StatsRegistry = StatsRegistry::new();
static JOURNAL: ProcessJournal = ReapJournal::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);
static INSTALL_LOCK: Mutex<()> = parking_lot::const_mutex(());

extern "C" fn on_child_state_change(_signal: c_int) {
    // waitpid clobbers errno for whatever code this interrupted
    let saved = Errno::last_raw();
    reap_terminated(&STATS, &JOURNAL);
    Errno::set_raw(saved);
}

/// Install the SIGCHLD handler
///
/// Must succeed once before any child is launched. Repeated calls are no-ops.
/// Interrupted blocking calls are restarted (`SA_RESTART`); stop/continue
/// transitions do not notify (`SA_NOCLDSTOP`).
pub fn init() -> SupervisorResult<()> {
    let _guard = INSTALL_LOCK.lock();
    if INSTALLED.load(Ordering::Acquire) {
        return Ok(());
    }

    let action = SigAction::new(
        SigHandler::Handler(on_child_state_change),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );

    // SAFETY: the handler only calls waitpid and touches atomics
    unsafe { sigaction(Signal::SIGCHLD, &action) }.map_err(|errno| {
        SupervisorError::HandlerInstallation {
            signal: "SIGCHLD",
            errno,
        }
    })?;

    INSTALLED.store(true, Ordering::Release);
    info!("SIGCHLD reaper installed; terminated children are reclaimed automatically");
    Ok(())
}

/// Whether `init()` has completed
pub fn is_initialized() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Process-wide child statistics
pub fn stats() -> &'static StatsRegistry {
    &STATS
}

/// Snapshot of the process-wide child statistics
pub fn snapshot_stats() -> ChildStats {
    STATS.snapshot()
}

/// Process-wide reap journal written by the handler
pub fn journal() -> &'static ProcessJournal {
    &JOURNAL
}

/// Reader positioned at the current end of the process-wide journal
pub fn journal_reader() -> JournalReader {
    JOURNAL.reader()
}
