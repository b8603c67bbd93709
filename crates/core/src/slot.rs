// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::irq::IrqContext;
use crate::line::LineId;
use crate::wait::WaitQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
struct SlotState {
    ready: bool,
    // Meaningful only while `ready` is set.
    line: u8,
}

/// The single-value mailbox shared between the edge handlers and the reader.
///
/// Exactly one event is pending at a time: a new edge overwrites an unread
/// previous event (last writer wins), which coalesces bursts faster than the
/// reader drains. Payload copy and ready-flag clear happen as one step
/// relative to all handlers, so an edge landing mid-consume re-sets the flag
/// and is delivered by the next read instead of being lost.
///
/// Constructed once per subsystem by the bring-up path and shared by handle.
#[derive(Debug, Default)]
pub struct EventSlot {
    queue: WaitQueue<SlotState>,
    // Lock-free mirror of the ready flag for non-mutating checks. Updated
    // inside the queue's critical section so it never disagrees for long.
    ready_hint: AtomicBool,
    pollers: Mutex<Vec<Weak<PollWaker>>>,
}

impl EventSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking readiness check. Never mutates, safe from any context.
    pub fn is_ready(&self) -> bool {
        self.ready_hint.load(Ordering::Acquire)
    }

    /// Interrupt-context entry point: stamp the payload with `line`, set the
    /// ready flag, and wake sleeping readers and registered pollers.
    ///
    /// Never sleeps. The critical sections it takes are bounded because no
    /// holder of either lock ever blocks while holding it.
    pub fn raise(&self, _cx: &IrqContext, line: LineId) {
        self.queue.with(|s| {
            s.line = line.get();
            s.ready = true;
            self.ready_hint.store(true, Ordering::Release);
        });
        self.queue.notify_all();
        self.wake_pollers();
    }

    /// Copy the pending identity out and clear the ready flag, indivisibly
    /// with respect to the handlers. `None` when nothing is pending.
    pub fn try_consume(&self) -> Option<LineId> {
        self.queue.with(|s| {
            if !s.ready {
                return None;
            }
            let line = s.line;
            s.ready = false;
            self.ready_hint.store(false, Ordering::Release);
            LineId::new(line).ok()
        })
    }

    /// Block until the ready flag is set. Unbounded by design: with no
    /// incoming edges this never returns.
    pub fn wait_ready(&self) {
        self.queue
            .wait_until(|s| if s.ready { Some(()) } else { None });
    }

    /// Bounded readiness wait, for multiplexed callers. Does not consume.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        self.queue
            .wait_timeout_until(timeout, |s| s.ready.then_some(()))
            .is_some()
    }

    /// Register a poll waker to be signaled on the next `raise`.
    pub(crate) fn attach_poller(&self, waker: &Arc<PollWaker>) {
        let mut pollers = self
            .pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pollers.retain(|w| w.strong_count() > 0);
        if !pollers
            .iter()
            .any(|w| w.as_ptr() == Arc::as_ptr(waker))
        {
            pollers.push(Arc::downgrade(waker));
        }
    }

    fn wake_pollers(&self) {
        let wakers: Vec<Arc<PollWaker>> = {
            let pollers = self
                .pollers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            pollers.iter().filter_map(Weak::upgrade).collect()
        };
        for waker in wakers {
            waker.wake();
        }
    }

    /// Diagnostic dump of the slot state.
    pub fn snapshot(&self) -> serde_json::Value {
        self.queue
            .with(|s| serde_json::to_value(*s).unwrap_or(serde_json::Value::Null))
    }
}

/// Wakeup target a poll table registers with event slots, so a later
/// multiplexed wait can be unblocked by any of them.
#[derive(Debug, Default)]
pub(crate) struct PollWaker {
    queue: WaitQueue<bool>,
}

impl PollWaker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn wake(&self) {
        self.queue.with(|woken| *woken = true);
        self.queue.notify_all();
    }

    /// Wait for a wake signal, consuming it. False on timeout.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        self.queue
            .wait_timeout_until(timeout, |woken| {
                if *woken {
                    *woken = false;
                    Some(())
                } else {
                    None
                }
            })
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn line(n: u8) -> LineId {
        LineId::new(n).unwrap()
    }

    #[test]
    fn test_slot_starts_empty() {
        let slot = EventSlot::new();
        assert!(!slot.is_ready());
        assert!(slot.try_consume().is_none());
    }

    #[test]
    fn test_raise_consume_lifecycle() {
        let slot = EventSlot::new();
        slot.raise(&IrqContext::new(), line(2));

        assert!(slot.is_ready());
        assert_eq!(slot.try_consume().unwrap().get(), 2);
        assert!(!slot.is_ready());
        assert!(slot.try_consume().is_none());
    }

    #[test]
    fn test_readiness_check_is_idempotent() {
        let slot = EventSlot::new();
        slot.raise(&IrqContext::new(), line(1));
        for _ in 0..16 {
            assert!(slot.is_ready());
        }
        slot.try_consume().unwrap();
        for _ in 0..16 {
            assert!(!slot.is_ready());
        }
    }

    #[test]
    fn test_back_to_back_raises_coalesce() {
        let slot = EventSlot::new();
        let cx = IrqContext::new();
        slot.raise(&cx, line(1));
        slot.raise(&cx, line(4));
        slot.raise(&cx, line(3));

        // Last writer wins; nothing queued behind it.
        assert_eq!(slot.try_consume().unwrap().get(), 3);
        assert!(slot.try_consume().is_none());
    }

    #[test]
    fn test_wait_ready_wakes_on_raise() {
        let slot = Arc::new(EventSlot::new());

        let signaler = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                slot.raise(&IrqContext::new(), line(5));
            })
        };

        slot.wait_ready();
        assert_eq!(slot.try_consume().unwrap().get(), 5);
        signaler.join().unwrap();
    }

    #[test]
    fn test_wait_ready_timeout_expires_without_edges() {
        let slot = EventSlot::new();
        assert!(!slot.wait_ready_timeout(Duration::from_millis(30)));
    }

    #[test]
    fn test_poller_woken_by_raise() {
        let slot = Arc::new(EventSlot::new());
        let waker = Arc::new(PollWaker::new());
        slot.attach_poller(&waker);

        let signaler = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                slot.raise(&IrqContext::new(), line(1));
            })
        };

        assert!(waker.wait_timeout(Duration::from_millis(500)));
        signaler.join().unwrap();
    }

    #[test]
    fn test_attach_poller_deduplicates() {
        let slot = EventSlot::new();
        let waker = Arc::new(PollWaker::new());
        slot.attach_poller(&waker);
        slot.attach_poller(&waker);
        let count = slot
            .pollers
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let slot = EventSlot::new();
        slot.raise(&IrqContext::new(), line(2));
        let snap = slot.snapshot();
        assert_eq!(snap["ready"], serde_json::json!(true));
        assert_eq!(snap["line"], serde_json::json!(2));
    }
}
