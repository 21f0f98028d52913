/*!
 * Launcher Tests
 * Children launched through the process launcher are reclaimed by the handler
 */

use crate::common::{is_zombie, wait_until};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::Duration;
use zombie_guard::reaper::{self, journal_reader};
use zombie_guard::{ExitDisposition, ProcessLauncher, SupervisorError, WorkerTask};

fn launcher() -> ProcessLauncher {
    zombie_guard::init().expect("install SIGCHLD handler");
    ProcessLauncher::new()
}

#[test]
#[serial]
fn test_init_is_idempotent() {
    zombie_guard::init().unwrap();
    zombie_guard::init().unwrap();
    assert!(reaper::is_initialized());
}

#[test]
#[serial]
fn test_launch_task_returns_child_pid() {
    let launcher = launcher();
    let before = reaper::snapshot_stats();

    let pid = launcher
        .launch_task(&WorkerTask::new(Duration::from_millis(50)))
        .unwrap();
    assert!(pid > 0);
    assert_eq!(reaper::snapshot_stats().created, before.created + 1);

    assert!(wait_until(Duration::from_secs(5), || {
        reaper::snapshot_stats().reaped == before.reaped + 1
    }));
    assert!(!is_zombie(pid));
}

#[test]
#[serial]
fn test_task_exit_code_is_journaled() {
    let launcher = launcher();
    let mut reader = journal_reader();

    let pid = launcher
        .launch_task(&WorkerTask::new(Duration::ZERO).with_exit_code(7))
        .unwrap();

    let mut events = Vec::new();
    assert!(wait_until(Duration::from_secs(5), || {
        events.extend(reader.drain(reaper::journal()).events);
        events.iter().any(|e| e.pid == pid)
    }));
    let event = events.iter().find(|e| e.pid == pid).unwrap();
    assert_eq!(event.disposition, ExitDisposition::Exited { code: 7 });
}

#[test]
#[serial]
fn test_missing_program_fails_only_in_child() {
    let launcher = launcher();
    let before = reaper::snapshot_stats();
    let mut reader = journal_reader();

    // The parent sees a successful launch
    let pid = launcher
        .launch_command("/does/not/exist", Vec::<String>::new())
        .unwrap();
    assert!(pid > 0);

    let mut events = Vec::new();
    assert!(wait_until(Duration::from_secs(5), || {
        events.extend(reader.drain(reaper::journal()).events);
        events.iter().any(|e| e.pid == pid)
    }));

    let event = events.iter().find(|e| e.pid == pid).unwrap();
    assert_eq!(event.disposition, ExitDisposition::Exited { code: 127 });
    assert!(event.disposition.is_abnormal());

    let after = reaper::snapshot_stats();
    assert_eq!(after.created, before.created + 1);
    assert_eq!(after.reaped, before.reaped + 1);
}

#[test]
#[serial]
fn test_launch_command_runs_program() {
    let launcher = launcher();
    let mut reader = journal_reader();

    let pid = launcher.launch_command("/bin/sh", ["-c", "exit 3"]).unwrap();

    let mut events = Vec::new();
    assert!(wait_until(Duration::from_secs(5), || {
        events.extend(reader.drain(reaper::journal()).events);
        events.iter().any(|e| e.pid == pid)
    }));
    let event = events.iter().find(|e| e.pid == pid).unwrap();
    assert_eq!(event.disposition, ExitDisposition::Exited { code: 3 });
}

#[test]
#[serial]
fn test_interior_nul_rejected_before_fork() {
    let launcher = launcher();
    let before = reaper::snapshot_stats();

    let err = launcher
        .launch_command("/bin/echo", ["bad\0arg"])
        .unwrap_err();
    assert!(matches!(err, SupervisorError::InvalidCommand(_)));
    assert_eq!(reaper::snapshot_stats().created, before.created);
}
