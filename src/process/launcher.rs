/*!
 * Process Launcher
 * Forks workers and external commands and counts them as created
 */

use super::types::{CommandSpec, Worker, WorkerTask};
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::EXEC_FAILURE_EXIT_CODE;
use crate::core::types::ChildPid;
use crate::reaper::{self, StatsRegistry};
use nix::libc::{self, c_char};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{fork, ForkResult};
use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use tracing::debug;

/// Launches children whose termination is reclaimed by the SIGCHLD reaper
///
/// A successful launch means the child has started, nothing more. Its exit
/// is observed asynchronously through the reaper.
#[derive(Clone, Copy)]
pub struct ProcessLauncher {
    stats: &'static StatsRegistry,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self {
            stats: reaper::stats(),
        }
    }

    /// Fork a child that runs the built-in worker task
    pub fn launch_task(&self, task: &WorkerTask) -> SupervisorResult<ChildPid> {
        ensure_reaper()?;
        let task = *task;
        let pid = self.spawn_child(move || run_task(&task))?;
        debug!(pid, duration_ms = task.duration.as_millis() as u64, "Launched worker task");
        Ok(pid)
    }

    /// Fork a child that executes `path` with `args`
    ///
    /// `path` is passed as argv[0]. If the program cannot be executed the
    /// child exits with status 127; the launch itself still succeeds.
    pub fn launch_command<P, I, S>(&self, path: P, args: I) -> SupervisorResult<ChildPid>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        ensure_reaper()?;

        // Everything that allocates happens before fork
        let program = to_cstring(path.as_ref().as_os_str())?;
        let mut argv = vec![program.clone()];
        for arg in args {
            argv.push(to_cstring(arg.as_ref())?);
        }
        let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
        argv_ptrs.push(ptr::null());

        let pid = self.spawn_child(move || {
            // SAFETY: both arrays are NUL-terminated and outlive the call;
            // execv only returns on failure
            unsafe { libc::execv(program.as_ptr(), argv_ptrs.as_ptr()) };
            // No destructors in the forked child
            std::mem::forget((program, argv, argv_ptrs));
            EXEC_FAILURE_EXIT_CODE
        })?;
        debug!(pid, path = %path.as_ref().display(), "Launched command");
        Ok(pid)
    }

    /// Launch whatever the worker describes
    pub fn launch(&self, worker: &Worker) -> SupervisorResult<ChildPid> {
        match worker {
            Worker::Task(task) => self.launch_task(task),
            Worker::Command(CommandSpec { path, args }) => self.launch_command(path, args),
        }
    }

    fn spawn_child<F>(&self, child_main: F) -> SupervisorResult<ChildPid>
    where
        F: FnOnce() -> i32,
    {
        // Counted before fork so the child can never be reaped uncounted
        let reservation = self.stats.reserve_created();

        // SAFETY: the child runs only async-signal-safe code before _exit/exec
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                reservation.commit();
                Ok(child.as_raw())
            }
            Ok(ForkResult::Child) => {
                let code = child_main();
                // SAFETY: leaves the forked child without running destructors or atexit hooks
                unsafe { libc::_exit(code) }
            }
            Err(errno) => {
                drop(reservation);
                Err(SupervisorError::ResourceExhaustion(errno))
            }
        }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_reaper() -> SupervisorResult<()> {
    if reaper::is_initialized() {
        Ok(())
    } else {
        Err(SupervisorError::NotInitialized)
    }
}

fn to_cstring(value: &OsStr) -> SupervisorResult<CString> {
    CString::new(value.as_bytes()).map_err(|_| {
        SupervisorError::InvalidCommand(format!(
            "{} contains a NUL byte",
            value.to_string_lossy()
        ))
    })
}

/// Child side of `launch_task`
fn run_task(task: &WorkerTask) -> i32 {
    // Termination requests aimed at the supervisor must end the worker too
    // SAFETY: restoring default dispositions is async-signal-safe
    unsafe {
        let _ = signal(Signal::SIGTERM, SigHandler::SigDfl);
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
    }
    std::thread::sleep(task.duration);
    task.exit_code
}
