/*!
 * Deferred Reap Journal
 *
 * Fixed-capacity, allocation-free ring that lets the SIGCHLD handler record
 * which children it reclaimed, so that log lines can be produced later from
 * ordinary control flow.
 *
 * # Design
 * - Writers (signal handlers, possibly on several threads) claim a sequence
 *   number with `fetch_add` and publish into `slots[seq % N]`
 * - Each slot carries a stamp (`seq + 1`, `0` while being written) so the
 *   single reader can tell a published entry from a stale or torn one
 * - A reader that falls more than `N` entries behind loses the oldest
 *   entries; they are reported as dropped, stats are unaffected
 */

use crate::core::types::{ChildPid, ExitDisposition, ReapedChild};
use std::sync::atomic::{AtomicU64, Ordering};

const SIGNALED_BIT: u64 = 1 << 16;
const CORE_DUMPED_BIT: u64 = 1 << 17;
const VALUE_MASK: u64 = 0xFFFF;

struct Slot {
    stamp: AtomicU64,
    payload: AtomicU64,
}

impl Slot {
    const fn new() -> Self {
        Self {
            stamp: AtomicU64::new(0),
            payload: AtomicU64::new(0),
        }
    }
}

/// Lock-free ring of reclaimed-child events
pub struct ReapJournal<const N: usize> {
    head: AtomicU64,
    slots: [Slot; N],
}

impl<const N: usize> ReapJournal<N> {
    pub const fn new() -> Self {
        const EMPTY: Slot = Slot::new();
        Self {
            head: AtomicU64::new(0),
            slots: [EMPTY; N],
        }
    }

    /// Capacity of the ring
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of events ever recorded
    pub fn recorded(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }

    /// Record one reclaimed child
    ///
    /// # Signal safety
    /// Wait-free: one `fetch_add` and three stores, no allocation.
    #[inline]
    pub fn record(&self, child: ReapedChild) {
        let seq = self.head.fetch_add(1, Ordering::AcqRel);
        let slot = &self.slots[(seq % N as u64) as usize];
        slot.stamp.store(0, Ordering::Release);
        slot.payload.store(encode(child), Ordering::Release);
        slot.stamp.store(seq + 1, Ordering::Release);
    }

    /// Create a reader positioned at the current end of the journal
    pub fn reader(&self) -> JournalReader {
        JournalReader {
            cursor: self.recorded(),
        }
    }

    /// Create a reader positioned at the very first event
    pub fn reader_from_start(&self) -> JournalReader {
        JournalReader { cursor: 0 }
    }
}

impl<const N: usize> Default for ReapJournal<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Events drained from the journal in one call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JournalDrain {
    pub events: Vec<ReapedChild>,
    /// Events overwritten before they could be read
    pub dropped: u64,
}

impl JournalDrain {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.dropped == 0
    }
}

/// Single-consumer cursor into a `ReapJournal`
///
/// Only used from ordinary control flow; draining allocates.
#[derive(Debug)]
pub struct JournalReader {
    cursor: u64,
}

impl JournalReader {
    /// Collect every event published since the previous drain
    pub fn drain<const N: usize>(&mut self, journal: &ReapJournal<N>) -> JournalDrain {
        let mut drained = JournalDrain::default();
        let head = journal.recorded();
        let cap = N as u64;

        if head.saturating_sub(self.cursor) > cap {
            let oldest_kept = head - cap;
            drained.dropped += oldest_kept - self.cursor;
            self.cursor = oldest_kept;
        }

        while self.cursor < head {
            let seq = self.cursor;
            let slot = &journal.slots[(seq % cap) as usize];
            let expected = seq + 1;

            let before = slot.stamp.load(Ordering::Acquire);
            if before < expected {
                // Claimed but not yet published; pick it up next time
                break;
            }
            let payload = slot.payload.load(Ordering::Acquire);
            let after = slot.stamp.load(Ordering::Acquire);

            if before == expected && after == expected {
                drained.events.push(decode(payload));
            } else {
                drained.dropped += 1;
            }
            self.cursor += 1;
        }

        drained
    }
}

fn encode(child: ReapedChild) -> u64 {
    let low = match child.disposition {
        ExitDisposition::Exited { code } => (code as u64) & VALUE_MASK,
        ExitDisposition::Signaled {
            signal,
            core_dumped,
        } => {
            let mut bits = SIGNALED_BIT | ((signal as u64) & VALUE_MASK);
            if core_dumped {
                bits |= CORE_DUMPED_BIT;
            }
            bits
        }
    };
    ((child.pid as u32 as u64) << 32) | low
}

fn decode(payload: u64) -> ReapedChild {
    let pid = (payload >> 32) as u32 as ChildPid;
    let value = (payload & VALUE_MASK) as i32;
    let disposition = if payload & SIGNALED_BIT != 0 {
        ExitDisposition::Signaled {
            signal: value,
            core_dumped: payload & CORE_DUMPED_BIT != 0,
        }
    } else {
        ExitDisposition::Exited { code: value }
    };
    ReapedChild::new(pid, disposition)
}
