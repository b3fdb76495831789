// Integration tests for the message ledger's quorum semantics: threshold
// outcomes, timeouts, unknown keys, and removal with an outstanding waiter.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cadre::{MessageLedger, ReportedResult, WaitOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestMsg {
    id: u32,
    data: u32,
}

fn msg(id: u32) -> TestMsg {
    TestMsg { id, data: id * 10 }
}

#[test]
fn quorum_of_acks_resolves_success() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    ledger.register("X", 3, 2, msg(1)).unwrap();
    ledger.update_status(1u32, &"X", ReportedResult::Success);
    ledger.update_status(2u32, &"X", ReportedResult::Success);
    ledger.update_status(3u32, &"X", ReportedResult::Failure);

    let started = Instant::now();
    assert_eq!(ledger.wait_on(&"X", Duration::from_secs(1)), WaitOutcome::Success);
    // All responses were already in; the wait must not consume the timeout.
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn missed_threshold_resolves_failure() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    ledger.register("Y", 3, 3, msg(2)).unwrap();
    ledger.update_status(1u32, &"Y", ReportedResult::Success);
    ledger.update_status(2u32, &"Y", ReportedResult::Success);
    ledger.update_status(3u32, &"Y", ReportedResult::Failure);

    assert_eq!(ledger.wait_on(&"Y", Duration::from_secs(1)), WaitOutcome::Failure);
}

#[test]
fn no_responses_times_out_after_the_full_duration() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    ledger.register("Z", 2, 2, msg(3)).unwrap();

    let started = Instant::now();
    assert_eq!(ledger.wait_on(&"Z", Duration::from_millis(100)), WaitOutcome::Timeout);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(100), "timed out early: {elapsed:?}");
}

#[test]
fn unknown_key_fails_immediately() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    let started = Instant::now();
    assert_eq!(
        ledger.wait_on(&"never-registered", Duration::from_secs(5)),
        WaitOutcome::Failure
    );
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn waiter_is_woken_by_late_responses() {
    let ledger: Arc<MessageLedger<u32, TestMsg>> = Arc::new(MessageLedger::new());
    ledger.register(42, 2, 1, msg(42)).unwrap();

    let responder = Arc::clone(&ledger);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        responder.update_status(1u32, &42, ReportedResult::Success);
        thread::sleep(Duration::from_millis(50));
        responder.update_status(2u32, &42, ReportedResult::Failure);
    });

    let started = Instant::now();
    assert_eq!(ledger.wait_on(&42, Duration::from_secs(5)), WaitOutcome::Success);
    // Resolved by the second response, well before the timeout.
    assert!(started.elapsed() < Duration::from_secs(2));
    handle.join().unwrap();
}

#[test]
fn duplicate_registration_fails_and_preserves_counters() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    ledger.register("dup", 3, 2, msg(7)).unwrap();
    ledger.update_status(1u32, &"dup", ReportedResult::Success);

    assert!(ledger.register("dup", 9, 9, msg(8)).is_err());
    assert_eq!(ledger.counters(&"dup"), Some((1, 0)));
    assert_eq!(ledger.try_retrieve(&"dup"), Some(msg(7)));
}

#[test]
fn retrieve_copies_payload_without_touching_counters() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    ledger.register("keep", 1, 1, msg(5)).unwrap();
    assert_eq!(ledger.try_retrieve(&"keep"), Some(msg(5)));
    assert_eq!(ledger.try_retrieve(&"keep"), Some(msg(5)));
    assert_eq!(ledger.counters(&"keep"), Some((0, 0)));
    assert_eq!(ledger.try_retrieve(&"missing"), None);
}

#[test]
fn removal_with_outstanding_waiter_is_safe() {
    let ledger: Arc<MessageLedger<u32, TestMsg>> = Arc::new(MessageLedger::new());
    ledger.register(9, 1, 1, msg(9)).unwrap();

    let waiter_ledger = Arc::clone(&ledger);
    let waiter = thread::spawn(move || waiter_ledger.wait_on(&9, Duration::from_millis(300)));

    // Remove the entry while the waiter is (very likely) blocked on it. The
    // waiter holds its own reference, so this must not invalidate the wait.
    thread::sleep(Duration::from_millis(50));
    assert!(ledger.remove(&9));
    assert!(!ledger.contains(&9));

    // Updates after removal are stale no-ops, so the waiter times out.
    ledger.update_status(1u32, &9, ReportedResult::Success);
    assert_eq!(waiter.join().unwrap(), WaitOutcome::Timeout);
}

#[test]
fn stale_update_after_resolution_is_tolerated() {
    let ledger: MessageLedger<&str, TestMsg> = MessageLedger::new();
    ledger.register("late", 1, 1, msg(1)).unwrap();
    ledger.update_status(1u32, &"late", ReportedResult::Success);
    assert_eq!(ledger.wait_on(&"late", Duration::from_secs(1)), WaitOutcome::Success);

    // A duplicate response from a slow node arrives after resolution.
    ledger.update_status(1u32, &"late", ReportedResult::Success);
    assert_eq!(ledger.counters(&"late"), Some((2, 0)));
    assert_eq!(ledger.wait_on(&"late", Duration::from_secs(1)), WaitOutcome::Success);
}
