/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use nix::errno::Errno;
use thiserror::Error;

/// Result type for supervisor operations
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Errors surfaced to callers of the supervisor control surface
///
/// Only process-creation failures and startup failures propagate. A child whose
/// program cannot be executed is reported through its exit disposition instead.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SupervisorError {
    #[error("Failed to create child process: {0}")]
    #[diagnostic(
        code(supervisor::resource_exhaustion),
        help("The process table or memory is exhausted. The launch may be retried later.")
    )]
    ResourceExhaustion(Errno),

    #[error("Failed to install {signal} handler: {errno}")]
    #[diagnostic(
        code(supervisor::handler_installation),
        help("Without the handler terminated children cannot be reclaimed. Startup must abort.")
    )]
    HandlerInstallation { signal: &'static str, errno: Errno },

    #[error("Reaper not initialized")]
    #[diagnostic(
        code(supervisor::not_initialized),
        help("Call zombie_guard::reaper::init() once before launching any child.")
    )]
    NotInitialized,

    #[error("Invalid command: {0}")]
    #[diagnostic(
        code(supervisor::invalid_command),
        help("Paths and arguments must not contain interior NUL bytes.")
    )]
    InvalidCommand(String),

    #[error("Daemonization failed during {step}: {errno}")]
    #[diagnostic(
        code(supervisor::daemonize),
        help("Run in the foreground with ZOMBIE_GUARD_FOREGROUND=1 to diagnose.")
    )]
    Daemonize { step: &'static str, errno: Errno },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(supervisor::config))]
    Config(String),

    #[error("Process inventory failed: {0}")]
    #[diagnostic(
        code(supervisor::inventory),
        help("Check that procfs is mounted and readable.")
    )]
    Inventory(String),
}

impl SupervisorError {
    /// Whether retrying the same operation later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SupervisorError::ResourceExhaustion(_))
    }
}
