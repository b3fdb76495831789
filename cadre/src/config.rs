use crate::error::PoolError;

pub const DEFAULT_WORKER_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "cadre-worker-";

/// Configuration for a [`WorkerPool`](crate::pool::WorkerPool).
///
/// Both the number of workers and the per-worker queue capacity are fixed at
/// construction; the pool never resizes at runtime.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// The number of dedicated worker threads.
    pub pool_size: usize,

    /// The capacity of each worker's private task queue.
    pub queue_capacity: usize,

    /// Prefix for worker thread names; the worker index is appended.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get(),
            queue_capacity: DEFAULT_WORKER_QUEUE_CAPACITY,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl PoolConfig {
    /// Convenience constructor for the common case of tuning both sizes.
    pub fn new(pool_size: usize, queue_capacity: usize) -> Self {
        Self {
            pool_size,
            queue_capacity,
            ..Self::default()
        }
    }

    /// Rejects configurations the pool cannot be built from.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.pool_size == 0 {
            return Err(PoolError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            PoolConfig::new(0, 8).validate(),
            Err(PoolError::InvalidConfig(_))
        ));
        assert!(matches!(
            PoolConfig::new(4, 0).validate(),
            Err(PoolError::InvalidConfig(_))
        ));
    }
}
