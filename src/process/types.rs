/*!
 * Process Types
 * What a launched child runs
 */

use crate::core::limits::{DEFAULT_TASK_DURATION, DEFAULT_TASK_EXIT_CODE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The built-in unit of work executed by a forked worker
///
/// The worker sleeps for `duration` and exits with `exit_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerTask {
    pub duration: Duration,
    pub exit_code: i32,
}

impl WorkerTask {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            exit_code: DEFAULT_TASK_EXIT_CODE,
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }
}

impl Default for WorkerTask {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_DURATION)
    }
}

/// An external program to run in place of the built-in task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandSpec {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Add command line arguments (argv[0] is always the path)
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// What the supervisor launches on every iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Worker {
    Task(WorkerTask),
    Command(CommandSpec),
}

impl Default for Worker {
    fn default() -> Self {
        Worker::Task(WorkerTask::default())
    }
}
