/*!
 * Procfs Scanner
 * Finds zombie processes by reading `/proc/<pid>/stat`
 */

use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::{FALLBACK_CLOCK_TICKS, PROC_ROOT};
use nix::unistd::{sysconf, SysconfVar};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Fields of `/proc/<pid>/stat` the inventory cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: i32,
    pub command: String,
    pub state: char,
    pub ppid: i32,
    /// utime + stime, in clock ticks
    pub cpu_ticks: u64,
}

impl ProcStat {
    pub fn is_zombie(&self) -> bool {
        self.state == 'Z'
    }
}

/// Parse the contents of a `stat` file
///
/// The command is the text between the first `(` and the *last* `)`, since
/// it may itself contain spaces and parentheses.
pub fn parse_stat(contents: &str) -> Option<ProcStat> {
    let open = contents.find('(')?;
    let close = contents.rfind(')')?;
    if close < open {
        return None;
    }

    let pid = contents[..open].trim().parse().ok()?;
    let command = contents[open + 1..close].to_string();

    // Fields after the command, starting with field 3 (state)
    let rest: Vec<&str> = contents[close + 1..].split_whitespace().collect();
    let state = rest.first()?.chars().next()?;
    let ppid = rest.get(1)?.parse().ok()?;
    // utime and stime are fields 14 and 15
    let utime: u64 = rest.get(11)?.parse().ok()?;
    let stime: u64 = rest.get(12)?.parse().ok()?;

    Some(ProcStat {
        pid,
        command,
        state,
        ppid,
        cpu_ticks: utime + stime,
    })
}

/// A zombie found by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZombieInfo {
    pub pid: i32,
    pub ppid: i32,
    pub command: String,
    /// Accumulated CPU time in whole seconds
    pub cpu_seconds: u64,
}

/// Scans a procfs tree
#[derive(Debug, Clone)]
pub struct ProcScanner {
    root: PathBuf,
    clock_ticks: u64,
}

impl ProcScanner {
    /// Scanner over the live `/proc`
    pub fn new() -> Self {
        let clock_ticks = sysconf(SysconfVar::CLK_TCK)
            .ok()
            .flatten()
            .filter(|&ticks| ticks > 0)
            .map(|ticks| ticks as u64)
            .unwrap_or(FALLBACK_CLOCK_TICKS);
        Self {
            root: PathBuf::from(PROC_ROOT),
            clock_ticks,
        }
    }

    /// Scanner over another procfs-shaped directory
    pub fn with_root<P: Into<PathBuf>>(root: P, clock_ticks: u64) -> Self {
        Self {
            root: root.into(),
            clock_ticks: clock_ticks.max(1),
        }
    }

    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    /// Read one process entry; `None` if it vanished or is unreadable
    pub fn stat(&self, pid: i32) -> Option<ProcStat> {
        let contents = fs::read_to_string(self.root.join(pid.to_string()).join("stat")).ok()?;
        parse_stat(&contents)
    }

    /// Every zombie currently visible, ordered by pid
    pub fn find_zombies(&self) -> SupervisorResult<Vec<ZombieInfo>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            SupervisorError::Inventory(format!("{}: {}", self.root.display(), e))
        })?;

        let mut zombies: Vec<ZombieInfo> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<i32>().ok())
            // Processes may exit between readdir and read
            .filter_map(|pid| self.stat(pid))
            .filter(ProcStat::is_zombie)
            .map(|stat| ZombieInfo {
                pid: stat.pid,
                ppid: stat.ppid,
                command: stat.command,
                cpu_seconds: stat.cpu_ticks / self.clock_ticks,
            })
            .collect();

        zombies.sort_by_key(|z| z.pid);
        Ok(zombies)
    }

    /// Command name of a parent, if it still exists
    pub fn command_of(&self, pid: i32) -> Option<String> {
        self.stat(pid).map(|stat| stat.command)
    }
}

impl Default for ProcScanner {
    fn default() -> Self {
        Self::new()
    }
}
