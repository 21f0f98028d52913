/*!
 * Zombie Guard
 *
 * Supervises short-lived worker processes:
 * - SIGCHLD-driven reclamation of every terminated child
 * - Lock-free created/reaped statistics
 * - Fork/exec launcher
 * - Interruptible spawn/wait supervisor loop with graceful shutdown
 * - Procfs zombie inventory
 */

pub mod core;
pub mod daemon;
pub mod inventory;
pub mod monitoring;
pub mod process;
pub mod reaper;
pub mod supervisor;

// Re-exports
pub use crate::core::{ChildPid, ExitDisposition, ReapedChild, SupervisorError, SupervisorResult};
pub use monitoring::{init_tracing, EventSink, FileEventLog, MemoryEventLog, TracingEventLog};
pub use process::{CommandSpec, ProcessLauncher, Worker, WorkerTask};
pub use reaper::{init, snapshot_stats, ChildStats, StatsRegistry};
pub use supervisor::{
    request_shutdown, RunSummary, StopReason, SupervisorConfig, SupervisorLoop, SupervisorState,
};
