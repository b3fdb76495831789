use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::ledger::{ReportedResult, WaitOutcome};
use crate::wait::wait_until_or_deadline;

/// Response counters for one tracked message. Both only ever increase while
/// the entry exists; saturating arithmetic tolerates late or duplicate
/// responses arriving after the entry has already resolved.
#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    acks: u32,
    failures: u32,
}

/// One tracked message: immutable expectations plus live counters and the
/// wait pair for the (at most one) blocked waiter.
pub(crate) struct MessageEntry<M> {
    responses_needed: u32,
    success_threshold: u32,
    payload: M,
    progress: Mutex<Progress>,
    arrived: Condvar,
}

impl<M: Clone> MessageEntry<M> {
    pub(crate) fn new(responses_needed: u32, success_threshold: u32, payload: M) -> Self {
        Self {
            responses_needed,
            success_threshold,
            payload,
            progress: Mutex::new(Progress::default()),
            arrived: Condvar::new(),
        }
    }

    /// Counts one response and wakes the waiter.
    pub(crate) fn record(&self, result: ReportedResult) {
        let mut progress = self.progress.lock().expect("entry progress poisoned");
        match result {
            ReportedResult::Success => progress.acks = progress.acks.saturating_add(1),
            ReportedResult::Failure => progress.failures = progress.failures.saturating_add(1),
        }
        self.arrived.notify_one();
    }

    /// Blocks until every expected response has arrived or `timeout` passes.
    ///
    /// On reaching the target: Success iff the ack count met the threshold.
    /// On deadline: Timeout, a normal outcome rather than an error.
    pub(crate) fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let guard = self.progress.lock().expect("entry progress poisoned");
        let (guard, resolved) =
            wait_until_or_deadline(&self.arrived, guard, deadline, |progress| {
                progress.acks.saturating_add(progress.failures) >= self.responses_needed
            });
        if !resolved {
            return WaitOutcome::Timeout;
        }
        if guard.acks >= self.success_threshold {
            WaitOutcome::Success
        } else {
            WaitOutcome::Failure
        }
    }

    /// Copy of the original payload; counters untouched.
    pub(crate) fn payload(&self) -> M {
        self.payload.clone()
    }

    /// Snapshot of (acks, failures), for introspection and tests.
    pub(crate) fn counters(&self) -> (u32, u32) {
        let progress = self.progress.lock().expect("entry progress poisoned");
        (progress.acks, progress.failures)
    }
}
