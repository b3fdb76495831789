//! # Worker Thread Module
//!
//! One dedicated thread draining one private bounded task queue. Workers are
//! created by the pool at construction and live until the pool is torn down.
//!
//! ## Key Concepts
//! - Wake pair: the thread parks on a Mutex/Condvar pair and is signalled on
//!   every enqueue and on termination.
//! - Backpressure: a full queue rejects the enqueue synchronously; nothing
//!   blocks waiting for space and nothing is dropped silently.
//! - Panic recovery: a panicking task is reported and the worker returns to
//!   its wait loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crossbeam_queue::ArrayQueue;
use tracing::{error, trace};

use crate::error::PoolError;
use crate::pool::task::Task;
use crate::registry::ThreadNameRegistry;

/// States a worker moves through. Transitions are owned by the worker's own
/// thread; other threads only observe them for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Thread spawned, wait loop not yet entered.
    PendingActivation = 0,
    /// Parked on the wake pair.
    Waiting = 1,
    /// Woken; deciding whether a task is available.
    PreparingToExecute = 2,
    /// Running a task outside the wait lock.
    Executing = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::PendingActivation,
            1 => WorkerState::Waiting,
            2 => WorkerState::PreparingToExecute,
            _ => WorkerState::Executing,
        }
    }
}

/// State shared between a worker's thread and its handle.
struct Shared {
    /// The worker's private FIFO; capacity fixed at construction.
    queue: ArrayQueue<Task>,
    running: AtomicBool,
    state: AtomicU8,
    wait_lock: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Handle to one dedicated worker thread.
pub struct Worker {
    id: usize,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread. `name` becomes the OS thread name and, when
    /// a registry is supplied, its entry there.
    pub(crate) fn spawn(
        id: usize,
        queue_capacity: usize,
        name: String,
        registry: Option<Arc<ThreadNameRegistry>>,
    ) -> Result<Self, PoolError> {
        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(queue_capacity),
            running: AtomicBool::new(true),
            state: AtomicU8::new(WorkerState::PendingActivation as u8),
            wait_lock: Mutex::new(()),
            wake: Condvar::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let thread_name = name.clone();
        let handle = std::thread::Builder::new()
            .name(name)
            .spawn(move || {
                Self::thread_main(thread_shared, id, thread_name, registry);
            })
            .map_err(|e| PoolError::ThreadSetup(e.to_string()))?;

        Ok(Self {
            id,
            shared,
            handle: Some(handle),
        })
    }

    /// Pushes a task into this worker's queue and wakes its thread.
    ///
    /// Fails fast with [`PoolError::QueueFull`] when the queue is at
    /// capacity and [`PoolError::Terminated`] after shutdown.
    pub(crate) fn try_enqueue(&self, task: Task) -> Result<(), PoolError> {
        // Push and notify under the wait lock so the wake cannot be lost
        // between the thread's predicate check and its park.
        let _wake = self.shared.wait_lock.lock().expect("worker wait lock poisoned");
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(PoolError::Terminated);
        }
        let task_id = task.id();
        if self.shared.queue.push(task).is_err() {
            return Err(PoolError::QueueFull {
                worker: self.id,
                capacity: self.shared.queue.capacity(),
            });
        }
        trace!(worker = self.id, task = task_id, "task enqueued");
        self.shared.wake.notify_one();
        Ok(())
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Best-effort snapshot of the queue depth.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    /// The state last published by the worker thread.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Clears the running flag and signals the thread under the wait lock.
    ///
    /// A task already executing is not interrupted; termination takes effect
    /// at the next wait point.
    pub(crate) fn terminate(&self) {
        let _wake = self.shared.wait_lock.lock().expect("worker wait lock poisoned");
        self.shared.running.store(false, Ordering::Release);
        self.shared.wake.notify_one();
    }

    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(worker = self.id, "worker thread panicked outside a task");
            }
        }
    }

    fn thread_main(
        shared: Arc<Shared>,
        id: usize,
        name: String,
        registry: Option<Arc<ThreadNameRegistry>>,
    ) {
        if let Some(registry) = &registry {
            registry.register_current(&name);
        }

        while shared.running.load(Ordering::Acquire) {
            shared.set_state(WorkerState::Waiting);
            let guard = shared.wait_lock.lock().expect("worker wait lock poisoned");
            let guard = shared
                .wake
                .wait_while(guard, |_| {
                    shared.running.load(Ordering::Acquire) && shared.queue.is_empty()
                })
                .expect("worker wait lock poisoned");

            shared.set_state(WorkerState::PreparingToExecute);
            if let Some(task) = shared.queue.pop() {
                shared.set_state(WorkerState::Executing);
                drop(guard);

                let task_id = task.id();
                trace!(worker = id, task = task_id, "task dequeued");
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.invoke())) {
                    let msg = if let Some(s) = payload.downcast_ref::<String>() {
                        s.clone()
                    } else if let Some(s) = payload.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else {
                        "unknown panic".to_string()
                    };
                    error!(worker = id, task = task_id, panic = %msg, "task panicked");
                }
            } else {
                shared.set_state(WorkerState::Waiting);
            }
        }

        if let Some(registry) = &registry {
            registry.deregister_current();
        }
        trace!(worker = id, "worker thread exiting");
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.terminate();
        self.join();
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("queue_len", &self.queue_len())
            .finish()
    }
}
