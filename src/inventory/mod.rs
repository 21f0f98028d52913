/*!
 * Zombie Inventory
 * Out-of-process audit of unreclaimed children through procfs
 */

pub mod report;
pub mod scanner;

pub use report::{analyze_parents, format_cpu_time, ParentSummary, ZombieReport};
pub use scanner::{parse_stat, ProcScanner, ProcStat, ZombieInfo};
