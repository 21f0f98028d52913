/*!
 * Lock-Free Child Statistics
 * Created/reaped counters shared between the launcher and the SIGCHLD handler
 *
 * # Design
 * - Two independent `AtomicU64` counters, no lock anywhere, so the signal
 *   handler can update them while it interrupts a thread reading them
 * - `active` is never stored; it is derived at snapshot time
 * - `reaped` is loaded before `created`, and every child is counted as
 *   created before it exists, so a snapshot never shows `reaped > created`
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the child statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildStats {
    pub created: u64,
    pub reaped: u64,
    pub active: u64,
}

impl ChildStats {
    /// True once every created child has been reclaimed
    pub fn is_quiescent(&self) -> bool {
        self.active == 0 && self.created == self.reaped
    }
}

/// Atomic child statistics
///
/// # Signal safety
/// Every method is a single atomic read-modify-write or load and may be
/// called from a signal handler.
#[repr(C, align(64))]
pub struct StatsRegistry {
    created: AtomicU64,
    reaped: AtomicU64,
}

impl StatsRegistry {
    #[inline]
    pub const fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
            reaped: AtomicU64::new(0),
        }
    }

    /// Count one newly created child
    #[inline(always)]
    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    /// Count `count` reclaimed children
    #[inline(always)]
    pub fn record_reaped(&self, count: u64) {
        if count > 0 {
            self.reaped.fetch_add(count, Ordering::SeqCst);
        }
    }

    /// Reserve a `created` slot ahead of a fork
    ///
    /// The slot is released again when the guard drops without `commit()`,
    /// which is what happens when process creation fails.
    #[inline]
    pub fn reserve_created(&self) -> CreatedReservation<'_> {
        self.record_created();
        CreatedReservation {
            stats: self,
            committed: false,
        }
    }

    /// Get snapshot of current stats (no locks required)
    #[inline]
    pub fn snapshot(&self) -> ChildStats {
        let reaped = self.reaped.load(Ordering::SeqCst);
        let created = self.created.load(Ordering::SeqCst);
        ChildStats {
            created,
            reaped,
            active: created.saturating_sub(reaped),
        }
    }

    fn release_created(&self) {
        self.created.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for StatsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for a `created` slot taken before forking
///
/// Must be committed in the parent once the child exists. The forked child
/// never drops it: it either replaces its image or calls `_exit`.
#[must_use = "dropping an uncommitted reservation releases the created slot"]
pub struct CreatedReservation<'a> {
    stats: &'a StatsRegistry,
    committed: bool,
}

impl CreatedReservation<'_> {
    /// Keep the slot: the child was created
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for CreatedReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.stats.release_created();
        }
    }
}
