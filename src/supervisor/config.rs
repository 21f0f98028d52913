/*!
 * Supervisor Configuration
 * Defaults from `core::limits`, overridable through the environment
 */

use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::{DEFAULT_LOG_FILE, DEFAULT_MAX_WORKERS, DEFAULT_WORKER_INTERVAL};
use crate::process::{CommandSpec, Worker, WorkerTask};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_INTERVAL_MS: &str = "ZOMBIE_GUARD_INTERVAL_MS";
pub const ENV_TASK_MS: &str = "ZOMBIE_GUARD_TASK_MS";
pub const ENV_MAX_WORKERS: &str = "ZOMBIE_GUARD_MAX_WORKERS";
pub const ENV_LOG_FILE: &str = "ZOMBIE_GUARD_LOG_FILE";
pub const ENV_FOREGROUND: &str = "ZOMBIE_GUARD_FOREGROUND";
pub const ENV_WORKER_CMD: &str = "ZOMBIE_GUARD_WORKER_CMD";

/// Supervisor loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SupervisorConfig {
    /// Pause between two launches
    pub interval: Duration,
    /// What each iteration launches
    pub worker: Worker,
    /// Drain after this many successful launches; `None` runs until shutdown
    pub max_workers: Option<u64>,
    /// Append-only event log
    pub log_file: PathBuf,
    /// Detach from the terminal before starting
    pub daemonize: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WORKER_INTERVAL,
            worker: Worker::default(),
            max_workers: Some(DEFAULT_MAX_WORKERS),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            daemonize: true,
        }
    }
}

impl SupervisorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_task(mut self, task: WorkerTask) -> Self {
        self.worker = Worker::Task(task);
        self
    }

    pub fn with_command(mut self, command: CommandSpec) -> Self {
        self.worker = Worker::Command(command);
        self
    }

    pub fn with_max_workers(mut self, max_workers: Option<u64>) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = path.into();
        self
    }

    pub fn with_daemonize(mut self, daemonize: bool) -> Self {
        self.daemonize = daemonize;
        self
    }

    /// Defaults with overrides read from the process environment
    pub fn from_env() -> SupervisorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> SupervisorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, ENV_INTERVAL_MS)? {
            config.interval = Duration::from_millis(ms);
        }

        if let Some(cmd) = lookup(ENV_WORKER_CMD).filter(|v| !v.trim().is_empty()) {
            let mut parts = cmd.split_whitespace();
            // filter above guarantees one token
            let path = parts.next().unwrap_or_default();
            config.worker = Worker::Command(CommandSpec::new(path).args(parts));
        } else if let Some(ms) = parse_var::<u64>(&lookup, ENV_TASK_MS)? {
            config.worker = Worker::Task(WorkerTask::new(Duration::from_millis(ms)));
        }

        if let Some(max) = parse_var::<u64>(&lookup, ENV_MAX_WORKERS)? {
            config.max_workers = (max > 0).then_some(max);
        }

        if let Some(path) = lookup(ENV_LOG_FILE).filter(|v| !v.is_empty()) {
            config.log_file = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_FOREGROUND) {
            config.daemonize = !parse_bool(ENV_FOREGROUND, &value)?;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> SupervisorResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SupervisorError::Config(format!("{key}={raw:?} is not a valid number"))),
    }
}

fn parse_bool(key: &str, raw: &str) -> SupervisorResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(SupervisorError::Config(format!(
            "{key}={raw:?} is not a boolean"
        ))),
    }
}
