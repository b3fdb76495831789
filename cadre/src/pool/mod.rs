//! # Worker Pool
//!
//! A fixed-length collection of dedicated worker threads, each with its own
//! bounded FIFO task queue. Submissions go to the worker with the shallowest
//! queue at dispatch time.
//!
//! ## Ordering
//! FIFO is guaranteed within one worker's queue; nothing is implied across
//! workers. The depth snapshot taken during dispatch is best-effort: two
//! concurrent submitters may read the same depths and pick the same worker,
//! which is tolerated because each worker fully serializes its own queue.

pub mod task;
pub mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::registry::ThreadNameRegistry;

pub use task::Task;
pub use worker::WorkerState;

use worker::Worker;

/// Fixed-size pool of dedicated worker threads.
///
/// Size and per-worker queue capacity are set at construction and never
/// change. Tearing the pool down while callers are still submitting is a
/// precondition violation; late submissions report
/// [`PoolError::Terminated`] on a best-effort basis.
pub struct WorkerPool {
    workers: Vec<Worker>,
    /// Serializes "snapshot depths, pick minimum, enqueue" so the dispatch
    /// decision and the enqueue are one unit. Never held across two worker
    /// locks at once.
    dispatch_lock: Mutex<()>,
    shutting_down: AtomicBool,
}

impl WorkerPool {
    /// Builds the pool and starts every worker thread.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Self::with_registry(config, None)
    }

    /// Builds the pool with a shared thread-name registry; each worker
    /// registers itself on startup and deregisters on exit.
    pub fn with_registry(
        config: PoolConfig,
        registry: Option<Arc<ThreadNameRegistry>>,
    ) -> Result<Self, PoolError> {
        config.validate()?;

        let mut workers = Vec::with_capacity(config.pool_size);
        for id in 0..config.pool_size {
            let name = format!("{}{}", config.thread_name_prefix, id);
            workers.push(Worker::spawn(
                id,
                config.queue_capacity,
                name,
                registry.clone(),
            )?);
        }
        debug!(
            pool_size = config.pool_size,
            queue_capacity = config.queue_capacity,
            "worker pool started"
        );

        Ok(Self {
            workers,
            dispatch_lock: Mutex::new(()),
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Submits a callable to the least-loaded worker.
    ///
    /// Returns [`PoolError::QueueFull`] when that worker's queue is at
    /// capacity; the task is dropped and the caller decides what to do next.
    pub fn execute<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Task::new(f))
    }

    /// Submits an already-built [`Task`].
    pub fn submit(&self, task: Task) -> Result<(), PoolError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(PoolError::Terminated);
        }

        let _dispatch = self.dispatch_lock.lock().expect("dispatch lock poisoned");
        let worker = self
            .workers
            .iter()
            .min_by_key(|w| w.queue_len())
            .expect("pool holds at least one worker");
        trace!(worker = worker.id(), task = task.id(), "dispatching");
        worker.try_enqueue(task)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Per-worker queue capacity the pool was built with.
    pub fn queue_capacity(&self) -> usize {
        self.workers
            .first()
            .map(Worker::queue_capacity)
            .unwrap_or(0)
    }

    /// Best-effort snapshot of every worker's queue depth.
    pub fn queue_depths(&self) -> Vec<usize> {
        self.workers.iter().map(Worker::queue_len).collect()
    }

    /// Last published state of every worker, for diagnostics.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(Worker::state).collect()
    }

    /// Signals every worker to stop and joins their threads. Idempotent;
    /// also performed on drop. Tasks already executing finish first.
    pub fn shutdown(&mut self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        for worker in &self.workers {
            worker.terminate();
        }
        for worker in &mut self.workers {
            worker.join();
        }
        debug!("worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("queue_depths", &self.queue_depths())
            .finish()
    }
}
