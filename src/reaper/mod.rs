/*!
 * Reaper Module
 * Signal-driven reclamation of terminated children and child statistics
 */

pub mod handler;
pub mod journal;
pub mod reclaim;
pub mod stats;

// Re-export for convenience
pub use handler::{init, is_initialized, journal, journal_reader, snapshot_stats, stats};
pub use journal::{JournalDrain, JournalReader, ReapJournal};
pub use reclaim::{reap_terminated, reclaim_all, Reclaimer};
pub use stats::{ChildStats, CreatedReservation, StatsRegistry};
