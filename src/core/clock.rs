//! Time source and a cancellable timer queue.
//!
//! Nothing here runs on its own thread. The owner calls [`Scheduler::poll`]
//! with the current time and handles whatever has fallen due.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Timer<T> {
    handle: TimerHandle,
    due_ms: u64,
    payload: T,
}

/// One-shot timers carrying a payload of type `T`.
#[derive(Debug)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            handle,
            due_ms: now_ms.saturating_add(delay_ms),
            payload,
        });
        handle
    }

    /// Drop a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Remove and return every timer due at or before `now_ms`, ordered by
    /// due time and then by scheduling order.
    pub fn poll(&mut self, now_ms: u64) -> Vec<(TimerHandle, T)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].due_ms <= now_ms {
                due.push(self.timers.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|t| (t.due_ms, t.handle.0));
        due.into_iter().map(|t| (t.handle, t.payload)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance(500);
        assert_eq!(other.now_ms(), 1_500);
        other.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn poll_returns_due_in_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0, 300, "c");
        scheduler.schedule(0, 100, "a");
        scheduler.schedule(0, 100, "b");
        scheduler.schedule(0, 900, "late");

        let fired: Vec<_> = scheduler.poll(300).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due(), Some(900));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule(0, 10, 1);
        let drop = scheduler.schedule(0, 10, 2);
        assert!(scheduler.cancel(drop));
        assert!(!scheduler.cancel(drop));
        assert!(scheduler.is_pending(keep));

        let fired: Vec<_> = scheduler.poll(10).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec![1]);
        assert!(!scheduler.is_pending(keep));
    }

    #[test]
    fn cancel_all_clears_queue() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0, 1, ());
        scheduler.schedule(0, 2, ());
        scheduler.cancel_all();
        assert!(scheduler.poll(u64::MAX).is_empty());
    }
}
