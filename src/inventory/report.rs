/*!
 * Zombie Report
 * Groups zombies by parent and renders the inventory report
 */

use super::scanner::{ProcScanner, ZombieInfo};
use crate::core::errors::SupervisorResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Zombies attributed to one parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentSummary {
    pub ppid: i32,
    /// `None` when the parent no longer exists
    pub command: Option<String>,
    pub zombie_count: usize,
}

/// Full inventory of zombies on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZombieReport {
    pub total: usize,
    pub zombies: Vec<ZombieInfo>,
    pub parents: Vec<ParentSummary>,
}

impl ZombieReport {
    /// Scan and analyze in one go
    pub fn collect(scanner: &ProcScanner) -> SupervisorResult<Self> {
        let zombies = scanner.find_zombies()?;
        let parents = analyze_parents(&zombies, |ppid| scanner.command_of(ppid));
        Ok(Self {
            total: zombies.len(),
            zombies,
            parents,
        })
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Zombie Process Report ===");
        let _ = writeln!(out, "Total Zombies: {}", self.total);
        let _ = writeln!(out);

        if self.zombies.is_empty() {
            let _ = writeln!(out, "No zombie processes found on the system!");
            return out;
        }

        let _ = writeln!(
            out,
            "{:<8}{:<8}{:<16}{:<8}{:<8}",
            "PID", "PPID", "Command", "State", "Time"
        );
        let _ = writeln!(out, "------- ------- ---------------- ----- --------");
        for zombie in &self.zombies {
            let _ = writeln!(
                out,
                "{:<8}{:<8}{:<16}{:<8}{}",
                zombie.pid,
                zombie.ppid,
                zombie.command,
                'Z',
                format_cpu_time(zombie.cpu_seconds)
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Parent Process Analysis:");
        for parent in &self.parents {
            match &parent.command {
                Some(command) => {
                    let _ = writeln!(
                        out,
                        "  PID {} ({}) has {} zombie children",
                        parent.ppid, command, parent.zombie_count
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "  PID {} (process terminated) has {} zombie children",
                        parent.ppid, parent.zombie_count
                    );
                }
            }
        }
        out
    }
}

/// Count zombies per parent, resolving each parent's command once
pub fn analyze_parents<F>(zombies: &[ZombieInfo], command_of: F) -> Vec<ParentSummary>
where
    F: Fn(i32) -> Option<String>,
{
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for zombie in zombies {
        *counts.entry(zombie.ppid).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(ppid, zombie_count)| ParentSummary {
            ppid,
            command: command_of(ppid),
            zombie_count,
        })
        .collect()
}

/// `HH:MM:SS`
pub fn format_cpu_time(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
