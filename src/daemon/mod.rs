/*!
 * Daemonization
 *
 * Detaches the process from its controlling terminal: fork, new session,
 * fork again, move to `/`, point stdin at `/dev/null` and stdout/stderr at
 * the log file. Must run before `reaper::init()` and before any thread is
 * spawned. A log file that cannot be opened is not fatal: the daemon keeps
 * its inherited stdout/stderr.
 */

use crate::core::errors::{SupervisorError, SupervisorResult};
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{chdir, close, dup2, fork, setsid, ForkResult};
use std::os::unix::io::RawFd;
use std::path::Path;
use tracing::warn;

const STDIN: RawFd = 0;
const STDOUT: RawFd = 1;
const STDERR: RawFd = 2;

/// Turn the calling process into a daemon
///
/// Returns only in the final daemon process; the intermediate parents exit
/// with status 0.
pub fn daemonize(log_file: &Path) -> SupervisorResult<()> {
    detach_from_parent("first fork")?;

    setsid().map_err(|errno| failed("setsid", errno))?;

    // The session leader exits so the daemon can never reacquire a terminal
    detach_from_parent("second fork")?;

    chdir("/").map_err(|errno| failed("chdir", errno))?;

    redirect_stdio(log_file)
}

fn detach_from_parent(step: &'static str) -> SupervisorResult<()> {
    // SAFETY: called before any thread exists; the parent exits immediately
    match unsafe { fork() } {
        // SAFETY: the intermediate parent has nothing left to flush
        Ok(ForkResult::Parent { .. }) => unsafe { nix::libc::_exit(0) },
        Ok(ForkResult::Child) => Ok(()),
        Err(errno) => Err(failed(step, errno)),
    }
}

fn redirect_stdio(log_file: &Path) -> SupervisorResult<()> {
    let null = open("/dev/null", OFlag::O_RDONLY, Mode::empty())
        .map_err(|errno| failed("open /dev/null", errno))?;
    dup2(null, STDIN).map_err(|errno| failed("dup2 stdin", errno))?;
    if null > STDERR {
        let _ = close(null);
    }

    // An unwritable log leaves stdout/stderr where they were
    let Some(log) = open_log(log_file) else {
        return Ok(());
    };
    dup2(log, STDOUT).map_err(|errno| failed("dup2 stdout", errno))?;
    dup2(log, STDERR).map_err(|errno| failed("dup2 stderr", errno))?;
    if log > STDERR {
        let _ = close(log);
    }

    Ok(())
}

/// Open the log file for appending, or `None` with a warning
fn open_log(log_file: &Path) -> Option<RawFd> {
    match open(
        log_file,
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        Mode::from_bits_truncate(0o644),
    ) {
        Ok(fd) => Some(fd),
        Err(errno) => {
            warn!(
                path = %log_file.display(),
                %errno,
                "Cannot open log file; stdout and stderr are not redirected"
            );
            None
        }
    }
}

fn failed(step: &'static str, errno: Errno) -> SupervisorError {
    SupervisorError::Daemonize { step, errno }
}
