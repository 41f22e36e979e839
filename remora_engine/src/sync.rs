//! Useful synchronization primitives for the worker lifecycle.

use std::sync::{Condvar, Mutex};

/// A `LockLatch` starts as false and eventually becomes true. You can block
/// until it becomes true, and re-lock it to false afterwards.
pub struct LockLatch {
    m: Mutex<bool>,
    v: Condvar,
}

impl LockLatch {
    #[inline]
    pub fn new() -> LockLatch {
        LockLatch {
            m: Mutex::new(false),
            v: Condvar::new(),
        }
    }

    /// Block until the latch is set.
    #[inline]
    pub fn wait(&self) {
        let mut guard = self.m.lock().unwrap();
        while !*guard {
            guard = self.v.wait(guard).unwrap();
        }
    }

    /// Sets the latch to true and notifies any threads waiting on it.
    #[inline]
    pub fn set(&self) {
        let mut guard = self.m.lock().unwrap();
        *guard = true;
        self.v.notify_all();
    }

    /// Locks the latch, causing threads to await its next set.
    #[inline]
    pub fn lock(&self) {
        let mut guard = self.m.lock().unwrap();
        *guard = false;
    }

    #[inline]
    fn new_value(value: bool) -> LockLatch {
        LockLatch {
            m: Mutex::new(value),
            v: Condvar::new(),
        }
    }

    #[inline]
    fn set_value(&self, value: bool) {
        let mut guard = self.m.lock().unwrap();
        *guard = value;
        self.v.notify_all();
    }

    #[inline]
    fn await_value(&self, value: bool) {
        let mut guard = self.m.lock().unwrap();
        while *guard != value {
            guard = self.v.wait(guard).unwrap();
        }
    }
}

impl Default for LockLatch {
    fn default() -> Self {
        LockLatch::new()
    }
}

/// A `GuardedBool` allows for waiting on a specific bool value.
pub struct GuardedBool {
    a: LockLatch,
}

impl GuardedBool {
    #[inline]
    pub fn new(value: bool) -> GuardedBool {
        GuardedBool {
            a: LockLatch::new_value(value),
        }
    }

    /// Sets the value and wakes any waiters.
    #[inline]
    pub fn set(&self, value: bool) {
        self.a.set_value(value);
    }

    /// Blocks until the value is observed.
    #[inline]
    pub fn wait(&self, value: bool) {
        self.a.await_value(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn latch_wakes_waiter() {
        let latch = Arc::new(LockLatch::new());
        let latch2 = Arc::clone(&latch);
        let handle = thread::spawn(move || {
            latch2.wait();
        });
        latch.set();
        handle.join().unwrap();
    }

    #[test]
    fn guarded_bool_round_trip() {
        let b = Arc::new(GuardedBool::new(false));
        let b2 = Arc::clone(&b);
        let handle = thread::spawn(move || {
            b2.wait(true);
            b2.set(false);
        });
        b.set(true);
        b.wait(false);
        handle.join().unwrap();
    }
}
