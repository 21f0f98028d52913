/*!
 * Supervisor Loop
 *
 * Launches a worker, waits out the interval, repeats until a termination
 * request arrives or the worker cap is reached.
 *
 * States: Running -> Draining -> Stopped. Draining is a single bookkeeping
 * step: it flushes pending reap events, writes the final log entries and
 * stops. Already-launched workers are left to finish on their own; the
 * reaper keeps reclaiming them until the process exits.
 */

use super::config::SupervisorConfig;
use super::interval::{wait_interval_guarded, WaitOutcome};
use super::shutdown::{self, ShutdownFlag};
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::types::{ExitDisposition, ReapedChild};
use crate::monitoring::{span_iteration, EventSink};
use crate::process::ProcessLauncher;
use crate::reaper::{self, ChildStats, JournalReader};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Supervisor loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    Running,
    Draining,
    Stopped,
}

/// Why the loop left the Running state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    ShutdownRequested,
    WorkerLimitReached,
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub launched: u64,
    pub launch_failures: u64,
    pub reap_events_logged: u64,
    pub reap_events_dropped: u64,
    pub stop_reason: StopReason,
    pub final_state: SupervisorState,
    pub stats: ChildStats,
}

/// The process-wide control loop
pub struct SupervisorLoop {
    config: SupervisorConfig,
    launcher: ProcessLauncher,
    sink: Arc<dyn EventSink>,
    shutdown: &'static ShutdownFlag,
    reap_events: JournalReader,
    state: SupervisorState,
    iterations: u64,
    launched: u64,
    launch_failures: u64,
    reap_events_logged: u64,
    reap_events_dropped: u64,
}

impl SupervisorLoop {
    pub fn new(config: SupervisorConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            launcher: ProcessLauncher::new(),
            sink,
            shutdown: shutdown::global(),
            reap_events: reaper::journal_reader(),
            state: SupervisorState::Running,
            iterations: 0,
            launched: 0,
            launch_failures: 0,
            reap_events_logged: 0,
            reap_events_dropped: 0,
        }
    }

    /// Watch a different shutdown flag than the process-wide one
    pub fn with_shutdown_flag(mut self, flag: &'static ShutdownFlag) -> Self {
        self.shutdown = flag;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run until shutdown or the worker cap
    ///
    /// Fails fast with `NotInitialized` if the reaper is not installed, so no
    /// worker is ever created without a handler to reclaim it.
    pub fn run(mut self) -> SupervisorResult<RunSummary> {
        if !reaper::is_initialized() {
            return Err(SupervisorError::NotInitialized);
        }

        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            max_workers = ?self.config.max_workers,
            "Supervisor loop starting"
        );

        let stop_reason = loop {
            if let Some(reason) = self.should_stop().or_else(|| self.limit_reached()) {
                break reason;
            }

            self.iterations += 1;
            let _span = span_iteration(self.iterations).entered();

            self.launch_worker()?;

            if let Some(reason) = self.limit_reached() {
                break reason;
            }

            if let WaitOutcome::Cancelled { remaining, .. } = self.wait() {
                debug!(remaining_ms = remaining.as_millis() as u64, "Interval wait abandoned");
                break StopReason::ShutdownRequested;
            }
        };

        Ok(self.drain(stop_reason))
    }

    fn should_stop(&self) -> Option<StopReason> {
        if self.shutdown.is_requested() {
            Some(StopReason::ShutdownRequested)
        } else {
            None
        }
    }

    fn limit_reached(&self) -> Option<StopReason> {
        match self.config.max_workers {
            Some(max) if self.launched >= max => Some(StopReason::WorkerLimitReached),
            _ => None,
        }
    }

    fn launch_worker(&mut self) -> SupervisorResult<()> {
        match self.launcher.launch(&self.config.worker) {
            Ok(pid) => {
                self.launched += 1;
                info!(pid, launched = self.launched, "Spawned worker");
                self.sink
                    .record(&format!("Spawned new worker with PID {}.", pid));
                Ok(())
            }
            Err(e) if e.is_retryable() => {
                // Retried on the next iteration
                self.launch_failures += 1;
                warn!(error = %e, "Failed to fork worker");
                self.sink.record("Error forking worker.");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Worker launch failed");
                Err(e)
            }
        }
    }

    /// Consults the shutdown flag before every sleep with SIGTERM/SIGINT
    /// blocked, so a request raised during the launch is never slept through
    fn wait(&mut self) -> WaitOutcome {
        let interval = self.config.interval;
        let flag = self.shutdown;
        let guarded = shutdown::termination_signals();
        let outcome = wait_interval_guarded(interval, &guarded, |_remaining| {
            self.flush_reap_events();
            if flag.is_requested() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        self.flush_reap_events();
        outcome
    }

    /// Turn journaled reap events into log lines
    fn flush_reap_events(&mut self) {
        let drained = self.reap_events.drain(reaper::journal());

        for child in &drained.events {
            self.sink.record(&reap_message(child));
            debug!(pid = child.pid, disposition = %child.disposition, "Worker reaped");
        }
        self.reap_events_logged += drained.events.len() as u64;

        if drained.dropped > 0 {
            warn!(dropped = drained.dropped, "Reap events overwritten before logging");
            self.reap_events_dropped += drained.dropped;
        }
    }

    fn drain(mut self, stop_reason: StopReason) -> RunSummary {
        self.state = SupervisorState::Draining;

        self.flush_reap_events();
        match stop_reason {
            StopReason::ShutdownRequested => {
                info!("Termination requested, draining");
                self.sink
                    .record("Received termination request. Shutting down gracefully...");
            }
            StopReason::WorkerLimitReached => {
                info!(launched = self.launched, "Worker limit reached, draining");
                self.sink
                    .record(&format!("Worker limit of {} reached.", self.launched));
            }
        }

        let stats = reaper::snapshot_stats();
        self.sink.record(&format!(
            "Stats: created={} reaped={} active={}.",
            stats.created, stats.reaped, stats.active
        ));
        self.sink.record("Daemon shutting down. Goodbye.");

        self.state = SupervisorState::Stopped;
        info!(
            iterations = self.iterations,
            launched = self.launched,
            created = stats.created,
            reaped = stats.reaped,
            active = stats.active,
            "Supervisor stopped"
        );

        RunSummary {
            iterations: self.iterations,
            launched: self.launched,
            launch_failures: self.launch_failures,
            reap_events_logged: self.reap_events_logged,
            reap_events_dropped: self.reap_events_dropped,
            stop_reason,
            final_state: self.state,
            stats,
        }
    }
}

/// Log line for one reclaimed worker
pub fn reap_message(child: &ReapedChild) -> String {
    match child.disposition {
        ExitDisposition::Exited { code } => {
            format!("Worker PID {} reaped. Exit status: {}.", child.pid, code)
        }
        ExitDisposition::Signaled { .. } => {
            format!("Worker PID {} reaped (terminated abnormally).", child.pid)
        }
    }
}
