use thiserror::Error;

/// Errors surfaced by the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The selected worker's queue is at capacity. The task was not enqueued;
    /// retrying (or dropping) is the caller's decision.
    #[error("Worker queue is full (worker: {worker}, capacity: {capacity})")]
    QueueFull { worker: usize, capacity: usize },
    #[error("Worker pool has been shut down")]
    Terminated,
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to spawn worker thread: {0}")]
    ThreadSetup(String),
}

/// Errors surfaced by the message ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Message key is already registered: {0}")]
    DuplicateKey(String),
}
