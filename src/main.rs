/*!
 * reaperd - Worker Supervisor Daemon
 *
 * Launches a short-lived worker every interval, reclaims every terminated
 * worker from its SIGCHLD handler and shuts down cleanly on SIGTERM/SIGINT.
 */

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use zombie_guard::daemon::daemonize;
use zombie_guard::supervisor::install_termination_handler;
use zombie_guard::{init_tracing, EventSink, FileEventLog, SupervisorConfig, SupervisorLoop};

fn main() -> ExitCode {
    init_tracing();

    let config = match SupervisorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if config.daemonize {
        if let Err(e) = daemonize(&config.log_file) {
            error!(error = %e, "Could not daemonize");
            return ExitCode::FAILURE;
        }
    }

    let sink: Arc<dyn EventSink> = Arc::new(FileEventLog::new(&config.log_file));
    sink.record("Daemon started successfully.");
    info!(pid = std::process::id(), log_file = %config.log_file.display(), "reaperd starting");

    // Without the reaper every worker would become a zombie
    if let Err(e) = zombie_guard::init().and_then(|()| install_termination_handler()) {
        error!(error = %e, "Signal handler installation failed");
        sink.record(&format!("Error configuring signal handlers: {}", e));
        return ExitCode::FAILURE;
    }

    match SupervisorLoop::new(config, sink).run() {
        Ok(summary) => {
            info!(
                iterations = summary.iterations,
                launched = summary.launched,
                launch_failures = summary.launch_failures,
                stop_reason = ?summary.stop_reason,
                "reaperd exiting"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Supervisor loop failed");
            ExitCode::FAILURE
        }
    }
}
