//! Completion Signal Module
//!
//! One-shot broadcast: one thread publishes a value, any number of threads
//! block until it is there and then read it concurrently.

use std::sync::{Condvar, Mutex, OnceLock, PoisonError};

/// One-shot broadcast value
#[derive(Debug)]
pub struct Completion<T> {
    value: OnceLock<T>,
    lock: Mutex<()>,
    fired: Condvar,
}

impl<T> Completion<T> {
    pub fn new() -> Self {
        Self {
            value: OnceLock::new(),
            lock: Mutex::new(()),
            fired: Condvar::new(),
        }
    }

    /// Publish `value` and wake every waiter
    ///
    /// Returns `false` (dropping `value`) if the signal already fired.
    pub fn fire(&self, value: T) -> bool {
        if self.value.set(value).is_err() {
            return false;
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.fired.notify_all();
        true
    }

    /// Block until the value is published
    pub fn wait(&self) -> &T {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            guard = self
                .fired
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// The value, if already published
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_fired(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fires_once() {
        let c = Completion::new();
        assert!(!c.is_fired());
        assert!(c.fire(1));
        assert!(!c.fire(2));
        assert_eq!(*c.wait(), 1);
        assert_eq!(c.get(), Some(&1));
    }

    #[test]
    fn test_wakes_every_waiter() {
        let c = Arc::new(Completion::<String>::new());
        let barrier = Arc::new(Barrier::new(9));
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    c.wait().clone()
                })
            })
            .collect();

        barrier.wait();
        thread::sleep(Duration::from_millis(20));
        c.fire("done".to_string());

        for w in waiters {
            assert_eq!(w.join().unwrap(), "done");
        }
    }

    #[test]
    fn test_wait_after_fire_returns_immediately() {
        let c = Completion::new();
        c.fire(vec![1, 2, 3]);
        assert_eq!(c.wait(), &vec![1, 2, 3]);
    }
}
