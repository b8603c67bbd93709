// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A wait queue connecting signaling producers to sleeping readers: shared
/// state guarded by a mutex, plus a condition variable readers sleep on.
///
/// Producers mutate the state through [`WaitQueue::with`] and then call
/// [`WaitQueue::notify_all`]; because every state change happens under the
/// same mutex the sleeping side re-checks under, a notification cannot be
/// lost between a reader's predicate check and its sleep.
#[derive(Debug, Default)]
pub struct WaitQueue<T> {
    state: Mutex<T>,
    readers: Condvar,
}

impl<T> WaitQueue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
            readers: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        // A panicking holder cannot leave the slot state torn (single-field
        // writes), so recover from poisoning instead of propagating it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the guarded state.
    ///
    /// The critical section is bounded: `f` must not sleep. Callers in
    /// interrupt context rely on this.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    /// Sleep until `pred` yields a value. The predicate is re-checked on
    /// every wake, so spurious wakeups never leak out.
    pub fn wait_until<R>(&self, mut pred: impl FnMut(&mut T) -> Option<R>) -> R {
        let mut guard = self.lock();
        loop {
            if let Some(out) = pred(&mut guard) {
                return out;
            }
            guard = self
                .readers
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Bounded variant of [`WaitQueue::wait_until`]; `None` once `timeout`
    /// elapses without the predicate passing.
    pub fn wait_timeout_until<R>(
        &self,
        timeout: Duration,
        mut pred: impl FnMut(&mut T) -> Option<R>,
    ) -> Option<R> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(out) = pred(&mut guard) {
                return Some(out);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            guard = self
                .readers
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Wake every sleeping reader. Non-blocking.
    pub fn notify_all(&self) {
        self.readers.notify_all();
    }
}
