/*!
 * System Limits and Constants
 *
 * Centralized location for the supervisor's defaults and fixed sizes.
 * Every value here can be overridden through `SupervisorConfig` unless noted.
 */

use std::time::Duration;

// =============================================================================
// SUPERVISOR LOOP
// =============================================================================

/// Interval between worker launches (5s)
pub const DEFAULT_WORKER_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound on launched workers before the loop drains on its own
/// Mirrors the historical daemon cap; `None` in config disables it
pub const DEFAULT_MAX_WORKERS: u64 = 100;

// =============================================================================
// WORKER TASK
// =============================================================================

/// How long the built-in worker task pretends to work (2s)
pub const DEFAULT_TASK_DURATION: Duration = Duration::from_secs(2);

/// Exit status of a worker that finished its task
pub const DEFAULT_TASK_EXIT_CODE: i32 = 0;

/// Exit status of a child whose `execv` failed
/// [POSIX-COMPAT] Same value shells use for "command not found"
pub const EXEC_FAILURE_EXIT_CODE: i32 = 127;

// =============================================================================
// REAPER
// =============================================================================

/// Number of slots in the deferred reap journal
/// Reap events beyond this backlog are counted as dropped, stats stay exact
pub const REAP_JOURNAL_CAPACITY: usize = 64;

// =============================================================================
// EVENT LOG
// =============================================================================

/// Default append-only event log
pub const DEFAULT_LOG_FILE: &str = "/tmp/daemon.log";

// =============================================================================
// INVENTORY
// =============================================================================

/// Root of the procfs mount scanned by the zombie inventory
pub const PROC_ROOT: &str = "/proc";

/// Clock ticks per second assumed when `sysconf(_SC_CLK_TCK)` is unavailable
/// [LINUX-COMPAT] USER_HZ on every mainstream architecture
pub const FALLBACK_CLOCK_TICKS: u64 = 100;

/// Default number of children spawned by the zombie creator
pub const DEFAULT_ZOMBIE_COUNT: u32 = 5;
