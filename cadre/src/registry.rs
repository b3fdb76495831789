//! Thread-name registry.
//!
//! Maps OS thread ids to human-readable names for diagnostics and log
//! correlation. The registry is an ordinary value: construct it, share it
//! with `Arc`, and hand it to the components that need it. Lookups take a
//! shared lock on the crate's own [`PhasedRwLock`]; registration takes an
//! exclusive one, so bursts of reads never serialize against each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::rwlock::PhasedRwLock;

#[derive(Debug, Default)]
pub struct ThreadNameRegistry {
    names: PhasedRwLock<HashMap<ThreadId, String>>,
}

impl ThreadNameRegistry {
    pub fn new() -> Self {
        Self {
            names: PhasedRwLock::new(HashMap::new()),
        }
    }

    /// Shared-ownership constructor for handing the registry to pools.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Records a name for `id`, replacing any previous one.
    pub fn register(&self, id: ThreadId, name: impl Into<String>) {
        self.names.write().insert(id, name.into());
    }

    /// Records a name for the calling thread.
    pub fn register_current(&self, name: impl Into<String>) {
        self.register(thread::current().id(), name);
    }

    pub fn name_of(&self, id: ThreadId) -> Option<String> {
        self.names.read().get(&id).cloned()
    }

    pub fn name_of_current(&self) -> Option<String> {
        self.name_of(thread::current().id())
    }

    /// Removes the entry for `id`; returns the name if one was registered.
    pub fn deregister(&self, id: ThreadId) -> Option<String> {
        self.names.write().remove(&id)
    }

    pub fn deregister_current(&self) -> Option<String> {
        self.deregister(thread::current().id())
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_current_thread() {
        let registry = ThreadNameRegistry::new();
        assert!(registry.name_of_current().is_none());
        registry.register_current("main-test");
        assert_eq!(registry.name_of_current().as_deref(), Some("main-test"));
        assert_eq!(registry.deregister_current().as_deref(), Some("main-test"));
        assert!(registry.name_of_current().is_none());
    }

    #[test]
    fn names_are_visible_across_threads() {
        let registry = ThreadNameRegistry::shared();
        let remote = Arc::clone(&registry);
        let handle = thread::spawn(move || {
            remote.register_current("helper");
            thread::current().id()
        });
        let id = handle.join().unwrap();
        assert_eq!(registry.name_of(id).as_deref(), Some("helper"));
    }

    #[test]
    fn reregistering_replaces_the_name() {
        let registry = ThreadNameRegistry::new();
        registry.register_current("first");
        registry.register_current("second");
        assert_eq!(registry.name_of_current().as_deref(), Some("second"));
        assert_eq!(registry.len(), 1);
    }
}
