//! Cadre: a synchronization core for threshold-coordinated services.
//!
//! Three primitives, all mutex/condition-variable based:
//! - [`rwlock`]: a phased, writer-preferring reader-writer lock.
//! - [`pool`]: a fixed-size pool of dedicated worker threads with bounded
//!   per-worker task queues and least-loaded dispatch.
//! - [`ledger`]: a keyed tracker that blocks a caller until enough
//!   acknowledgments arrive for a message or a deadline expires.
//!
//! Message delivery, networking, and retry policy live in the embedding
//! application; everything here reports its outcome synchronously to the
//! immediate caller.

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod pool;
pub mod registry;
pub mod rwlock;
pub mod wait;

// Re-export the types most callers touch.
pub use config::PoolConfig;
pub use error::{LedgerError, PoolError};
pub use ledger::{MessageLedger, ReportedResult, WaitOutcome};
pub use pool::{Task, WorkerPool, WorkerState};
pub use registry::ThreadNameRegistry;
pub use rwlock::{PhasedReadGuard, PhasedRwLock, PhasedWriteGuard, RawPhasedLock};
