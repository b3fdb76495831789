// Display-format tests for the crate's error types.

use cadre::{LedgerError, PoolError};

#[test]
fn pool_error_display() {
    assert_eq!(
        PoolError::QueueFull { worker: 2, capacity: 64 }.to_string(),
        "Worker queue is full (worker: 2, capacity: 64)"
    );
    assert_eq!(PoolError::Terminated.to_string(), "Worker pool has been shut down");
    assert_eq!(
        PoolError::InvalidConfig("pool_size must be at least 1".to_string()).to_string(),
        "Invalid pool configuration: pool_size must be at least 1"
    );
    assert_eq!(
        PoolError::ThreadSetup("no threads left".to_string()).to_string(),
        "Failed to spawn worker thread: no threads left"
    );
}

#[test]
fn ledger_error_display() {
    assert_eq!(
        LedgerError::DuplicateKey("\"X\"".to_string()).to_string(),
        "Message key is already registered: \"X\""
    );
}
