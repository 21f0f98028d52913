/*!
 * Interval Wait Tests
 * Interruptions by SIGCHLD shorten the sleep but never the wait
 */

use nix::libc::c_int;
use nix::sys::pthread::{pthread_kill, pthread_self};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use zombie_guard::supervisor::{
    sleep_interruptible, wait_interval, wait_interval_guarded, SleepOutcome, WaitOutcome,
};

const INTERVAL: Duration = Duration::from_millis(600);

/// Run `body` on a fresh thread and pelt it with SIGCHLD `count` times
fn interrupt_thread<T, F>(count: u32, body: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    zombie_guard::init().unwrap();

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        tx.send(pthread_self()).unwrap();
        body()
    });

    let target = rx.recv().unwrap();
    for _ in 0..count {
        thread::sleep(Duration::from_millis(100));
        pthread_kill(target, Signal::SIGCHLD).unwrap();
    }
    worker.join().unwrap()
}

#[test]
#[serial]
fn test_single_sleep_reports_remaining() {
    let outcome = interrupt_thread(1, || sleep_interruptible(INTERVAL));

    match outcome {
        SleepOutcome::Interrupted { remaining } => {
            assert!(remaining > Duration::ZERO);
            assert!(remaining < INTERVAL);
        }
        SleepOutcome::Completed => panic!("sleep was not interrupted"),
    }
}

#[test]
#[serial]
fn test_interrupted_wait_lasts_full_interval() {
    let (outcome, elapsed) = interrupt_thread(3, || {
        let start = Instant::now();
        let outcome = wait_interval(INTERVAL, |_| ControlFlow::Continue(()));
        (outcome, start.elapsed())
    });

    assert_eq!(outcome, WaitOutcome::Elapsed { interruptions: 3 });
    assert!(elapsed >= INTERVAL, "waited only {:?}", elapsed);
    assert!(elapsed < INTERVAL + Duration::from_millis(300));
}

#[test]
#[serial]
fn test_callback_can_abandon_wait() {
    let (outcome, elapsed) = interrupt_thread(1, || {
        let start = Instant::now();
        let outcome = wait_interval(INTERVAL, |_| ControlFlow::Break(()));
        (outcome, start.elapsed())
    });

    match outcome {
        WaitOutcome::Cancelled {
            remaining,
            interruptions,
        } => {
            assert_eq!(interruptions, 1);
            assert!(remaining > Duration::ZERO);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(elapsed < INTERVAL);
}

#[test]
#[serial]
fn test_callback_sees_shrinking_remainder() {
    let remainders = interrupt_thread(2, || {
        let mut seen = Vec::new();
        wait_interval(INTERVAL, |remaining| {
            seen.push(remaining);
            ControlFlow::Continue(())
        });
        seen
    });

    assert_eq!(remainders.len(), 2);
    assert!(remainders[0] > remainders[1]);
    assert!(remainders[0] < INTERVAL);
}

static USR1_SEEN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_usr1(_signal: c_int) {
    USR1_SEEN.store(true, Ordering::SeqCst);
}

#[test]
#[serial]
fn test_guarded_signal_raised_before_sleep_is_not_slept_through() {
    let action = SigAction::new(SigHandler::Handler(on_usr1), SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGUSR1, &action) }.unwrap();
    USR1_SEEN.store(false, Ordering::SeqCst);

    let mut guarded = SigSet::empty();
    guarded.add(Signal::SIGUSR1);

    let (tx, rx) = mpsc::channel();
    let waiter = thread::spawn(move || {
        let start = Instant::now();
        let mut checks = 0u32;
        let outcome = wait_interval_guarded(Duration::from_secs(2), &guarded, |_| {
            checks += 1;
            if checks == 1 {
                // Signal arrives while the waiter is awake, before its first sleep
                tx.send(pthread_self()).unwrap();
                thread::sleep(Duration::from_millis(200));
            }
            if USR1_SEEN.load(Ordering::SeqCst) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        (outcome, checks, start.elapsed())
    });

    let target = rx.recv().unwrap();
    pthread_kill(target, Signal::SIGUSR1).unwrap();
    let (outcome, checks, elapsed) = waiter.join().unwrap();

    assert_eq!(checks, 2);
    assert!(matches!(
        outcome,
        WaitOutcome::Cancelled {
            interruptions: 1,
            ..
        }
    ));
    assert!(elapsed < Duration::from_secs(1), "slept {:?}", elapsed);
}
