/*!
 * Supervisor Loop Tests
 * Worker cap, pre-requested shutdown and event log contents
 */

use crate::common::wait_until;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::Arc;
use std::time::{Duration, Instant};
use zombie_guard::reaper;
use zombie_guard::supervisor::ShutdownFlag;
use zombie_guard::{
    EventSink, FileEventLog, MemoryEventLog, StopReason, SupervisorConfig, SupervisorLoop,
    SupervisorState, WorkerTask,
};

/// Raises `flag` as soon as a worker has been spawned
struct ShutdownOnSpawn {
    flag: &'static ShutdownFlag,
    log: MemoryEventLog,
}

impl EventSink for ShutdownOnSpawn {
    fn record(&self, message: &str) {
        if message.starts_with("Spawned new worker") {
            self.flag.request();
        }
        self.log.record(message);
    }
}

fn config(interval_ms: u64, task_ms: u64, max_workers: u64) -> SupervisorConfig {
    SupervisorConfig::default()
        .with_interval(Duration::from_millis(interval_ms))
        .with_task(WorkerTask::new(Duration::from_millis(task_ms)))
        .with_max_workers(Some(max_workers))
        .with_daemonize(false)
}

#[test]
#[serial]
fn test_loop_drains_at_worker_limit() {
    static FLAG: ShutdownFlag = ShutdownFlag::new();
    zombie_guard::init().unwrap();
    let before = reaper::snapshot_stats();
    let sink = Arc::new(MemoryEventLog::new());

    let start = Instant::now();
    let summary = SupervisorLoop::new(config(200, 20, 3), sink.clone())
        .with_shutdown_flag(&FLAG)
        .run()
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.launched, 3);
    assert_eq!(summary.launch_failures, 0);
    assert_eq!(summary.stop_reason, StopReason::WorkerLimitReached);
    assert_eq!(summary.final_state, SupervisorState::Stopped);

    // Two full intervals separate three launches; no wait after the last
    assert!(elapsed >= Duration::from_millis(400), "ran only {:?}", elapsed);

    let entries = sink.entries();
    let spawned = entries
        .iter()
        .filter(|e| e.starts_with("Spawned new worker with PID "))
        .count();
    assert_eq!(spawned, 3);
    assert_eq!(
        entries.last().map(String::as_str),
        Some("Daemon shutting down. Goodbye.")
    );

    assert!(wait_until(Duration::from_secs(5), || {
        reaper::snapshot_stats().reaped == before.reaped + 3
    }));
    let after = reaper::snapshot_stats();
    assert_eq!(after.created, before.created + 3);
    assert_eq!(after.active, 0);
}

#[test]
#[serial]
fn test_requested_shutdown_prevents_any_launch() {
    static FLAG: ShutdownFlag = ShutdownFlag::new();
    zombie_guard::init().unwrap();
    FLAG.request();
    let before = reaper::snapshot_stats();
    let sink = Arc::new(MemoryEventLog::new());

    let summary = SupervisorLoop::new(config(1000, 10, 10), sink.clone())
        .with_shutdown_flag(&FLAG)
        .run()
        .unwrap();

    assert_eq!(summary.launched, 0);
    assert_eq!(summary.iterations, 0);
    assert_eq!(summary.stop_reason, StopReason::ShutdownRequested);
    assert_eq!(reaper::snapshot_stats().created, before.created);
    assert!(sink.contains("Received termination request. Shutting down gracefully..."));
}

#[test]
#[serial]
fn test_reap_events_reach_event_log() {
    static FLAG: ShutdownFlag = ShutdownFlag::new();
    zombie_guard::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("daemon.log");
    let sink = Arc::new(FileEventLog::new(&log_path));

    // Workers finish well inside the interval, so every exit is flushed by
    // the final drain at the latest
    let summary = SupervisorLoop::new(config(150, 10, 2), sink)
        .with_shutdown_flag(&FLAG)
        .run()
        .unwrap();
    assert_eq!(summary.launched, 2);

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents.matches("Spawned new worker with PID").count(), 2);
    assert!(contents.contains("reaped. Exit status: 0."));
    assert!(contents.contains("Stats: created="));
    assert!(contents.lines().all(|line| line.contains(" PID ")));
}

#[test]
#[serial]
fn test_shutdown_during_launch_skips_interval() {
    static FLAG: ShutdownFlag = ShutdownFlag::new();
    zombie_guard::init().unwrap();
    let before = reaper::snapshot_stats();
    let sink = Arc::new(ShutdownOnSpawn {
        flag: &FLAG,
        log: MemoryEventLog::new(),
    });
    let config = SupervisorConfig::default()
        .with_interval(Duration::from_secs(2))
        .with_task(WorkerTask::new(Duration::from_millis(50)))
        .with_max_workers(None)
        .with_daemonize(false);

    let start = Instant::now();
    let summary = SupervisorLoop::new(config, sink.clone())
        .with_shutdown_flag(&FLAG)
        .run()
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(summary.launched, 1);
    assert_eq!(summary.stop_reason, StopReason::ShutdownRequested);
    assert!(elapsed < Duration::from_millis(500), "slept {:?}", elapsed);
    assert!(sink
        .log
        .contains("Received termination request. Shutting down gracefully..."));

    assert!(wait_until(Duration::from_secs(5), || {
        reaper::snapshot_stats().reaped >= before.reaped + 1
    }));
}

#[test]
#[serial]
fn test_zero_worker_cap_launches_nothing() {
    static FLAG: ShutdownFlag = ShutdownFlag::new();
    zombie_guard::init().unwrap();
    let before = reaper::snapshot_stats();
    let sink = Arc::new(MemoryEventLog::new());

    let summary = SupervisorLoop::new(config(1000, 10, 0), sink.clone())
        .with_shutdown_flag(&FLAG)
        .run()
        .unwrap();

    assert_eq!(summary.launched, 0);
    assert_eq!(summary.iterations, 0);
    assert_eq!(summary.stop_reason, StopReason::WorkerLimitReached);
    assert_eq!(reaper::snapshot_stats().created, before.created);
    assert!(sink.contains("Worker limit of 0 reached."));
}
