/*!
 * Supervisor Module
 * Spawn/wait control loop, interval wait, shutdown and configuration
 */

pub mod config;
pub mod control;
pub mod interval;
pub mod shutdown;

// Re-export for convenience
pub use config::SupervisorConfig;
pub use control::{reap_message, RunSummary, StopReason, SupervisorLoop, SupervisorState};
pub use interval::{
    sleep_interruptible, wait_interval, wait_interval_guarded, SleepOutcome, WaitOutcome,
};
pub use shutdown::{
    install_termination_handler, is_shutdown_requested, request_shutdown, termination_signals,
    ShutdownFlag,
};
