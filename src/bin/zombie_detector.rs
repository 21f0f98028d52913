//! Zombie inventory report
//!
//! Scans procfs for processes in state `Z` and prints who their parents are.

use anyhow::{bail, Context, Result};
use std::env;
use zombie_guard::inventory::{ProcScanner, ZombieReport};

fn main() -> Result<()> {
    let mut json = false;
    let mut root = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--proc-root" => {
                root = Some(args.next().context("--proc-root needs a directory")?);
            }
            "-h" | "--help" => {
                println!("Usage: zombie-detector [--json] [--proc-root <dir>]");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    let scanner = match root {
        Some(dir) => ProcScanner::with_root(dir, ProcScanner::new().clock_ticks()),
        None => ProcScanner::new(),
    };

    let report = ZombieReport::collect(&scanner).context("scanning for zombies")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
