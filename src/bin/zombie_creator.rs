//! Zombie generator for exercising the inventory tooling
//!
//! Forks `count` children that exit at once and deliberately never reaps
//! them. Press ENTER to exit and let init clean up.

use anyhow::{bail, Context, Result};
use nix::unistd::{fork, ForkResult};
use std::env;
use std::io::BufRead;
use zombie_guard::core::limits::DEFAULT_ZOMBIE_COUNT;

fn parse_count(args: &[String]) -> Result<u32> {
    match args {
        [] => Ok(DEFAULT_ZOMBIE_COUNT),
        [count] => match count.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => bail!("Usage: zombie-creator <number_of_zombies>"),
        },
        _ => bail!("Usage: zombie-creator <number_of_zombies>"),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let count = parse_count(&args)?;

    println!("Creating {} zombie processes...", count);
    for i in 0..count {
        // SAFETY: single-threaded; the child exits immediately
        match unsafe { fork() }.context("fork")? {
            // SAFETY: the child exits at once without touching shared state
            ForkResult::Child => unsafe { nix::libc::_exit(i as i32) },
            ForkResult::Parent { child } => {
                println!("Created zombie: PID {} (exit code {})", child, i);
            }
        }
    }

    println!(
        "\nZombies created. Parent (PID {}) stays alive.",
        std::process::id()
    );
    println!("Inspect them with zombie-detector or: ps aux | grep Z");
    println!("Press ENTER to exit and let the zombies be cleaned up...");

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    println!("Parent exiting.");
    Ok(())
}
