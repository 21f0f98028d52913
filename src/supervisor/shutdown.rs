/*!
 * Shutdown Flag
 * Termination requests delivered by SIGTERM/SIGINT
 */

use crate::core::errors::{SupervisorError, SupervisorResult};
use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// One-way flag: false until a termination request arrives
#[derive(Debug)]
pub struct ShutdownFlag(AtomicBool);

impl ShutdownFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Safe to call from a signal handler; idempotent
    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

static SHUTDOWN: ShutdownFlag = ShutdownFlag::new();

/// The process-wide flag read by the supervisor loop
pub fn global() -> &'static ShutdownFlag {
    &SHUTDOWN
}

/// Request a graceful shutdown of the process-wide supervisor
pub fn request_shutdown() {
    SHUTDOWN.request();
}

pub fn is_shutdown_requested() -> bool {
    SHUTDOWN.is_requested()
}

/// Signals that request a graceful shutdown
pub fn termination_signals() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGTERM);
    set.add(Signal::SIGINT);
    set
}

extern "C" fn on_termination(_signal: c_int) {
    request_shutdown();
}

/// Route SIGTERM and SIGINT to the process-wide shutdown flag
///
/// Installed without `SA_RESTART` so a pending interval wait is cut short.
pub fn install_termination_handler() -> SupervisorResult<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_termination),
        SaFlags::empty(),
        SigSet::empty(),
    );

    for (signal, name) in [(Signal::SIGTERM, "SIGTERM"), (Signal::SIGINT, "SIGINT")] {
        // SAFETY: the handler performs a single atomic store
        unsafe { sigaction(signal, &action) }.map_err(|errno| {
            SupervisorError::HandlerInstallation {
                signal: name,
                errno,
            }
        })?;
    }

    info!("Termination handler installed for SIGTERM and SIGINT");
    Ok(())
}
