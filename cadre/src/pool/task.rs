use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ids are process-wide so traces from different pools stay distinguishable.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(0);

/// A unit of work submitted to the pool: one boxed callable with its
/// arguments already captured.
///
/// There is a single invoke contract regardless of the callable's original
/// signature; anything a caller wants back out must be captured shared state.
pub struct Task {
    id: u64,
    run: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            run: Box::new(f),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Consumes the task, executing its callable exactly once.
    pub fn invoke(self) {
        (self.run)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn invoke_runs_the_callable_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let task = Task::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        task.invoke();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ids_are_unique() {
        let a = Task::new(|| {});
        let b = Task::new(|| {});
        assert_ne!(a.id(), b.id());
    }
}
