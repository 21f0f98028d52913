/*!
 * Core Types
 * Common types shared by the reaper, launcher and supervisor
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// OS process identifier of a launched child (raw `pid_t`)
pub type ChildPid = i32;

/// How a reclaimed child terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitDisposition {
    /// Normal exit with the given status code
    Exited { code: i32 },
    /// Terminated by a signal
    Signaled { signal: i32, core_dumped: bool },
}

impl ExitDisposition {
    /// True only for a normal exit with status 0
    pub fn is_success(&self) -> bool {
        matches!(self, ExitDisposition::Exited { code: 0 })
    }

    /// True for a signal-terminated child or a non-zero exit code
    pub fn is_abnormal(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for ExitDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitDisposition::Exited { code } => write!(f, "exited with status {}", code),
            ExitDisposition::Signaled {
                signal,
                core_dumped: true,
            } => write!(f, "killed by signal {} (core dumped)", signal),
            ExitDisposition::Signaled { signal, .. } => write!(f, "killed by signal {}", signal),
        }
    }
}

/// A child that was reclaimed by the reaper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapedChild {
    pub pid: ChildPid,
    pub disposition: ExitDisposition,
}

impl ReapedChild {
    pub fn new(pid: ChildPid, disposition: ExitDisposition) -> Self {
        Self { pid, disposition }
    }
}
