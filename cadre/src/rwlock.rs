//! # Phased Reader-Writer Lock
//!
//! A writer-preferring shared/exclusive lock built from one packed state word
//! and two condition-variable gates.
//!
//! ## Key Concepts
//! - Gate 1 admits new participants: readers while no writer has entered,
//!   and the next writer once the previous one leaves.
//! - Gate 2 drains readers: a writer that has entered parks here until the
//!   reader count reaches zero.
//! - Once a writer sets the entered flag, no new reader is admitted until
//!   that writer completes; readers already holding the lock finish normally.
//!
//! [`RawPhasedLock`] exposes the acquire/release primitives directly;
//! [`PhasedRwLock`] wraps them around owned data with RAII guards so the
//! lock is released on every exit path.

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::wait::wait_until_or_deadline;

/// Top bit: a writer has entered (holds the lock or is draining readers).
const WRITE_ENTERED: u32 = 1 << 31;
/// Remaining bits: the count of readers currently holding the lock.
const READER_MASK: u32 = !WRITE_ENTERED;

/// The raw acquire/release primitives of the phased lock.
///
/// Release methods must only be called by a holder of the corresponding
/// acquisition; this is not detected at runtime. Prefer [`PhasedRwLock`]
/// unless the lock guards something other than a single Rust value.
pub struct RawPhasedLock {
    state: Mutex<u32>,
    gate1: Condvar,
    gate2: Condvar,
}

impl Default for RawPhasedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawPhasedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.state.lock().expect("lock state poisoned");
        f.debug_struct("RawPhasedLock")
            .field("write_entered", &(state & WRITE_ENTERED != 0))
            .field("readers", &(state & READER_MASK))
            .finish()
    }
}

impl RawPhasedLock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(0),
            gate1: Condvar::new(),
            gate2: Condvar::new(),
        }
    }

    /// Acquires exclusive access, blocking until granted.
    pub fn lock(&self) {
        let guard = self.state.lock().expect("lock state poisoned");
        let mut guard = self
            .gate1
            .wait_while(guard, |state| *state & WRITE_ENTERED != 0)
            .expect("lock state poisoned");
        *guard |= WRITE_ENTERED;
        let _guard = self
            .gate2
            .wait_while(guard, |state| *state & READER_MASK != 0)
            .expect("lock state poisoned");
    }

    /// Acquires exclusive access only if the lock is entirely free.
    pub fn try_lock(&self) -> bool {
        let mut state = self.state.lock().expect("lock state poisoned");
        if *state == 0 {
            *state = WRITE_ENTERED;
            true
        } else {
            false
        }
    }

    /// Acquires exclusive access, giving up after `rel_time`.
    pub fn try_lock_for(&self, rel_time: Duration) -> bool {
        self.try_lock_until(Instant::now() + rel_time)
    }

    /// Acquires exclusive access, giving up at `deadline`.
    ///
    /// If the deadline expires while waiting for readers to drain, the
    /// entered flag is rolled back and gate 1 is woken so blocked readers
    /// are not stranded behind a writer that no longer exists.
    pub fn try_lock_until(&self, deadline: Instant) -> bool {
        let guard = self.state.lock().expect("lock state poisoned");
        let (mut guard, entered) =
            wait_until_or_deadline(&self.gate1, guard, deadline, |state| {
                *state & WRITE_ENTERED == 0
            });
        if !entered {
            return false;
        }
        *guard |= WRITE_ENTERED;

        let (mut guard, drained) =
            wait_until_or_deadline(&self.gate2, guard, deadline, |state| {
                *state & READER_MASK == 0
            });
        if !drained {
            *guard &= !WRITE_ENTERED;
            self.gate1.notify_all();
            return false;
        }
        true
    }

    /// Releases exclusive access and admits the next writer or any readers.
    pub fn unlock(&self) {
        let mut state = self.state.lock().expect("lock state poisoned");
        debug_assert!(*state & WRITE_ENTERED != 0);
        *state &= READER_MASK;
        self.gate1.notify_all();
    }

    /// Acquires shared access, blocking until granted.
    pub fn lock_shared(&self) {
        let guard = self.state.lock().expect("lock state poisoned");
        let mut guard = self
            .gate1
            .wait_while(guard, |state| {
                *state & WRITE_ENTERED != 0 || *state & READER_MASK == READER_MASK
            })
            .expect("lock state poisoned");
        *guard += 1;
    }

    /// Acquires shared access only if no writer has entered and the reader
    /// count is not saturated.
    pub fn try_lock_shared(&self) -> bool {
        let mut state = self.state.lock().expect("lock state poisoned");
        if *state & WRITE_ENTERED == 0 && *state & READER_MASK < READER_MASK {
            *state += 1;
            true
        } else {
            false
        }
    }

    /// Acquires shared access, giving up after `rel_time`.
    pub fn try_lock_shared_for(&self, rel_time: Duration) -> bool {
        self.try_lock_shared_until(Instant::now() + rel_time)
    }

    /// Acquires shared access, giving up at `deadline`.
    ///
    /// Both admission conditions are re-checked after every wake; a wake on
    /// gate 1 may mean a writer left, readers desaturated, or nothing at all.
    pub fn try_lock_shared_until(&self, deadline: Instant) -> bool {
        let guard = self.state.lock().expect("lock state poisoned");
        let (mut guard, admitted) =
            wait_until_or_deadline(&self.gate1, guard, deadline, |state| {
                *state & WRITE_ENTERED == 0 && *state & READER_MASK < READER_MASK
            });
        if admitted {
            *guard += 1;
        }
        admitted
    }

    /// Releases shared access.
    ///
    /// The last reader to leave wakes a writer draining on gate 2; a reader
    /// leaving a saturated count re-opens gate 1 for one blocked reader.
    pub fn unlock_shared(&self) {
        let mut state = self.state.lock().expect("lock state poisoned");
        debug_assert!(*state & READER_MASK != 0);
        let readers = (*state & READER_MASK) - 1;
        *state = (*state & WRITE_ENTERED) | readers;
        if *state & WRITE_ENTERED != 0 {
            if readers == 0 {
                self.gate2.notify_one();
            }
        } else if readers == READER_MASK - 1 {
            self.gate1.notify_one();
        }
    }

    /// Best-effort snapshot of the current reader count, for diagnostics.
    pub fn reader_count(&self) -> u32 {
        *self.state.lock().expect("lock state poisoned") & READER_MASK
    }
}

/// Owned data protected by a [`RawPhasedLock`], accessed through RAII guards.
pub struct PhasedRwLock<T: ?Sized> {
    raw: RawPhasedLock,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for PhasedRwLock<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for PhasedRwLock<T> {}

impl<T: Default> Default for PhasedRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> PhasedRwLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            raw: RawPhasedLock::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consumes the lock, returning the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> PhasedRwLock<T> {
    /// Acquires shared access, blocking until granted.
    pub fn read(&self) -> PhasedReadGuard<'_, T> {
        self.raw.lock_shared();
        PhasedReadGuard { lock: self }
    }

    pub fn try_read(&self) -> Option<PhasedReadGuard<'_, T>> {
        self.raw
            .try_lock_shared()
            .then(|| PhasedReadGuard { lock: self })
    }

    /// Timed shared acquisition; `None` means the attempt expired and the
    /// lock was left untouched.
    pub fn try_read_for(&self, rel_time: Duration) -> Option<PhasedReadGuard<'_, T>> {
        self.raw
            .try_lock_shared_for(rel_time)
            .then(|| PhasedReadGuard { lock: self })
    }

    pub fn try_read_until(&self, deadline: Instant) -> Option<PhasedReadGuard<'_, T>> {
        self.raw
            .try_lock_shared_until(deadline)
            .then(|| PhasedReadGuard { lock: self })
    }

    /// Acquires exclusive access, blocking until granted.
    pub fn write(&self) -> PhasedWriteGuard<'_, T> {
        self.raw.lock();
        PhasedWriteGuard { lock: self }
    }

    pub fn try_write(&self) -> Option<PhasedWriteGuard<'_, T>> {
        self.raw.try_lock().then(|| PhasedWriteGuard { lock: self })
    }

    /// Timed exclusive acquisition; on expiry the entered flag has been
    /// rolled back and the lock remains usable.
    pub fn try_write_for(&self, rel_time: Duration) -> Option<PhasedWriteGuard<'_, T>> {
        self.raw
            .try_lock_for(rel_time)
            .then(|| PhasedWriteGuard { lock: self })
    }

    pub fn try_write_until(&self, deadline: Instant) -> Option<PhasedWriteGuard<'_, T>> {
        self.raw
            .try_lock_until(deadline)
            .then(|| PhasedWriteGuard { lock: self })
    }

    /// Exclusive access through `&mut self` without locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for PhasedRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_read() {
            Some(guard) => f.debug_struct("PhasedRwLock").field("data", &&*guard).finish(),
            None => f.debug_struct("PhasedRwLock").field("data", &"<locked>").finish(),
        }
    }
}

/// Shared access to a [`PhasedRwLock`]; releases on drop.
pub struct PhasedReadGuard<'a, T: ?Sized> {
    lock: &'a PhasedRwLock<T>,
}

impl<T: ?Sized> Deref for PhasedReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Shared acquisition is held for the guard's lifetime, so readers
        // may alias but no writer can exist.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for PhasedReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.unlock_shared();
    }
}

/// Exclusive access to a [`PhasedRwLock`]; releases on drop.
pub struct PhasedWriteGuard<'a, T: ?Sized> {
    lock: &'a PhasedRwLock<T>,
}

impl<T: ?Sized> Deref for PhasedWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Exclusive acquisition is held for the guard's lifetime.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for PhasedWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for PhasedWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.unlock();
    }
}
