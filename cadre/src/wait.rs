//! Deadline-bounded condition-variable waiting.
//!
//! Every blocking primitive in this crate waits the same way: hold a mutex,
//! re-check a predicate after each wake, and never trust a single wake to
//! mean the condition holds. Condition variables may wake spuriously or for
//! unrelated state changes, so the predicate is authoritative and the
//! remaining timeout is recomputed from a fixed deadline on every iteration.

use std::sync::{Condvar, MutexGuard};
use std::time::Instant;

/// Blocks on `cond` until `pred` returns true or `deadline` passes.
///
/// Returns the guard (re-acquired) and whether the predicate was satisfied.
/// A final predicate check is performed after a timed-out wake, so a
/// notification that races with the deadline is still observed.
pub fn wait_until_or_deadline<'a, T, F>(
    cond: &Condvar,
    mut guard: MutexGuard<'a, T>,
    deadline: Instant,
    mut pred: F,
) -> (MutexGuard<'a, T>, bool)
where
    F: FnMut(&T) -> bool,
{
    while !pred(&*guard) {
        let now = Instant::now();
        if now >= deadline {
            return (guard, false);
        }
        let (reacquired, timeout) = cond
            .wait_timeout(guard, deadline - now)
            .expect("wait mutex poisoned");
        guard = reacquired;
        if timeout.timed_out() {
            let satisfied = pred(&*guard);
            return (guard, satisfied);
        }
    }
    (guard, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::{Duration, Instant};

    #[test]
    fn returns_immediately_when_predicate_already_holds() {
        let mtx = Mutex::new(5u32);
        let cond = Condvar::new();
        let start = Instant::now();
        let guard = mtx.lock().unwrap();
        let (_guard, satisfied) = wait_until_or_deadline(
            &cond,
            guard,
            start + Duration::from_secs(5),
            |v| *v == 5,
        );
        assert!(satisfied);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn times_out_when_predicate_never_holds() {
        let mtx = Mutex::new(0u32);
        let cond = Condvar::new();
        let start = Instant::now();
        let guard = mtx.lock().unwrap();
        let (_guard, satisfied) = wait_until_or_deadline(
            &cond,
            guard,
            start + Duration::from_millis(100),
            |v| *v != 0,
        );
        assert!(!satisfied);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn observes_notification_from_another_thread() {
        let shared = Arc::new((Mutex::new(false), Condvar::new()));
        let notifier = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            let (mtx, cond) = &*notifier;
            *mtx.lock().unwrap() = true;
            cond.notify_one();
        });

        let (mtx, cond) = &*shared;
        let guard = mtx.lock().unwrap();
        let (_guard, satisfied) = wait_until_or_deadline(
            cond,
            guard,
            Instant::now() + Duration::from_secs(5),
            |done| *done,
        );
        assert!(satisfied);
        handle.join().unwrap();
    }
}
