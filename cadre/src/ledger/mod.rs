//! # Message Ledger
//!
//! A keyed table tracking how many acknowledgments and failures have come
//! back for each outstanding message, with a blocking quorum wait.
//!
//! ## Key Concepts
//! - Registration declares, up front, how many responses are expected and
//!   how many acks make the outcome a success.
//! - Updates are fed by the caller's delivery layer as remote participants
//!   respond; updates for unknown keys are treated as stale and ignored.
//! - `wait_on` blocks until every expected response has arrived or a
//!   deadline passes. At most one waiter per key is supported; concurrent
//!   waiters on the same key are outside the contract.
//!
//! Entries are reference counted: removal drops the table's reference, while
//! a concurrently blocked waiter keeps the entry alive through its own. The
//! ledger never expires entries on its own — every `register` is balanced by
//! an explicit `remove`.

pub mod entry;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::LedgerError;
use entry::MessageEntry;

/// A remote participant's reported outcome for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedResult {
    Success,
    Failure,
}

/// Result of a quorum wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// All expected responses arrived and the ack count met the threshold.
    Success,
    /// All expected responses arrived but too few were acks, or the key was
    /// never registered.
    Failure,
    /// The deadline passed first. A normal outcome, not an error.
    Timeout,
}

/// Keyed quorum tracker for in-flight messages.
pub struct MessageLedger<K, M> {
    table: Mutex<HashMap<K, Arc<MessageEntry<M>>>>,
}

impl<K, M> Default for MessageLedger<K, M>
where
    K: Eq + Hash + fmt::Debug,
    M: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, M> MessageLedger<K, M>
where
    K: Eq + Hash + fmt::Debug,
    M: Clone,
{
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Starts tracking `key`, expecting `responses_needed` responses of
    /// which `success_threshold` acks make the outcome a success.
    ///
    /// Fails with [`LedgerError::DuplicateKey`] if the key is already
    /// registered, leaving the existing entry untouched. A threshold above
    /// `responses_needed` is accepted but can never resolve to success.
    pub fn register(
        &self,
        key: K,
        responses_needed: u32,
        success_threshold: u32,
        payload: M,
    ) -> Result<(), LedgerError> {
        if success_threshold > responses_needed {
            warn!(
                key = ?key,
                responses_needed,
                success_threshold,
                "success threshold exceeds expected responses; entry can only fail or time out"
            );
        }
        let mut table = self.table.lock().expect("ledger table poisoned");
        if table.contains_key(&key) {
            return Err(LedgerError::DuplicateKey(format!("{key:?}")));
        }
        trace!(key = ?key, responses_needed, success_threshold, "message registered");
        table.insert(
            key,
            Arc::new(MessageEntry::new(responses_needed, success_threshold, payload)),
        );
        Ok(())
    }

    /// Registers with a unanimous threshold: every response must be an ack.
    pub fn register_unanimous(
        &self,
        key: K,
        responses_needed: u32,
        payload: M,
    ) -> Result<(), LedgerError> {
        self.register(key, responses_needed, responses_needed, payload)
    }

    /// Counts one response from `node_id` against `key` and wakes the waiter.
    ///
    /// Unknown keys are a no-op: the update is treated as stale (the entry
    /// was removed, or never registered here) rather than an error.
    pub fn update_status<N: fmt::Display>(&self, node_id: N, key: &K, result: ReportedResult) {
        let entry = {
            let table = self.table.lock().expect("ledger table poisoned");
            table.get(key).cloned()
        };
        match entry {
            Some(entry) => {
                trace!(key = ?key, node = %node_id, ?result, "response recorded");
                entry.record(result);
            }
            None => {
                debug!(key = ?key, node = %node_id, ?result, "stale response for unknown key ignored");
            }
        }
    }

    /// Blocks until `key` has received all expected responses or `timeout`
    /// passes.
    ///
    /// An unregistered key fails immediately without blocking. The wait runs
    /// outside the table lock, so registrations, updates, and removals
    /// proceed while a waiter is parked.
    pub fn wait_on(&self, key: &K, timeout: Duration) -> WaitOutcome {
        let entry = {
            let table = self.table.lock().expect("ledger table poisoned");
            table.get(key).cloned()
        };
        match entry {
            Some(entry) => entry.wait(timeout),
            None => WaitOutcome::Failure,
        }
    }

    /// Copy of the payload stored at registration; counters untouched.
    pub fn try_retrieve(&self, key: &K) -> Option<M> {
        let table = self.table.lock().expect("ledger table poisoned");
        table.get(key).map(|entry| entry.payload())
    }

    /// Stops tracking `key`; returns whether an entry was removed.
    ///
    /// A waiter currently blocked on the key holds its own reference to the
    /// entry, so it stays valid; subsequent updates miss the table and the
    /// waiter resolves or times out on what it has already seen.
    pub fn remove(&self, key: &K) -> bool {
        let removed = self
            .table
            .lock()
            .expect("ledger table poisoned")
            .remove(key)
            .is_some();
        if removed {
            trace!(key = ?key, "message removed");
        }
        removed
    }

    pub fn contains(&self, key: &K) -> bool {
        self.table.lock().expect("ledger table poisoned").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.lock().expect("ledger table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().expect("ledger table poisoned").is_empty()
    }

    /// Snapshot of (acks, failures) for a key, for diagnostics and tests.
    pub fn counters(&self, key: &K) -> Option<(u32, u32)> {
        let table = self.table.lock().expect("ledger table poisoned");
        table.get(key).map(|entry| entry.counters())
    }
}

impl<K, M> fmt::Debug for MessageLedger<K, M>
where
    K: Eq + Hash + fmt::Debug,
    M: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageLedger").field("len", &self.len()).finish()
    }
}
