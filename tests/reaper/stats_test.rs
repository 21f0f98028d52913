/*!
 * Statistics Tests
 * created/reaped/active accounting under real SIGCHLD delivery
 */

use crate::common::wait_until;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::Duration;
use zombie_guard::reaper;
use zombie_guard::{ProcessLauncher, WorkerTask};

#[test]
#[serial]
fn test_five_tasks_all_reaped() {
    zombie_guard::init().unwrap();
    let launcher = ProcessLauncher::new();
    let before = reaper::snapshot_stats();

    let task = WorkerTask::new(Duration::from_millis(300));
    for _ in 0..5 {
        launcher.launch_task(&task).unwrap();
    }

    let launched = reaper::snapshot_stats();
    assert_eq!(launched.created, before.created + 5);

    assert!(wait_until(Duration::from_secs(5), || {
        reaper::snapshot_stats().reaped == before.reaped + 5
    }));

    let after = reaper::snapshot_stats();
    assert_eq!(after.created, before.created + 5);
    assert_eq!(after.reaped, before.reaped + 5);
    assert_eq!(after.active, 0);
    assert!(after.is_quiescent());
}

#[test]
#[serial]
fn test_simultaneous_exits_are_all_counted() {
    zombie_guard::init().unwrap();
    let launcher = ProcessLauncher::new();
    let before = reaper::snapshot_stats();

    // Children that exit at once coalesce into fewer SIGCHLDs
    let task = WorkerTask::new(Duration::ZERO);
    for _ in 0..20 {
        launcher.launch_task(&task).unwrap();
    }

    assert!(wait_until(Duration::from_secs(5), || {
        reaper::snapshot_stats().reaped == before.reaped + 20
    }));
    assert_eq!(reaper::snapshot_stats().active, 0);
}

#[test]
#[serial]
fn test_active_never_exceeds_created_while_in_flight() {
    zombie_guard::init().unwrap();
    let launcher = ProcessLauncher::new();
    let before = reaper::snapshot_stats();

    let task = WorkerTask::new(Duration::from_millis(20));
    for _ in 0..10 {
        launcher.launch_task(&task).unwrap();
        let snap = reaper::snapshot_stats();
        assert!(snap.reaped <= snap.created);
        assert_eq!(snap.active, snap.created - snap.reaped);
    }

    assert!(wait_until(Duration::from_secs(5), || {
        let snap = reaper::snapshot_stats();
        assert!(snap.reaped <= snap.created);
        snap.reaped == before.reaped + 10
    }));
}
