//! `TimerQueue` — pending timed resumptions keyed by virtual time.
//!
//! # Why this exists
//!
//! Processes suspend on `env.timeout(d)` far more often than on anything
//! else.  Instead of scanning every process each step, a suspended timeout
//! registers the instant at which its task needs attention; the executor pops
//! only the earliest one.
//!
//! Entries sharing an instant are kept in a `VecDeque` and popped in
//! insertion order.  Each carries the executor's sequence number so the
//! executor can interleave them with same-instant wakes.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::task::Waker;

use dc_core::SimTime;

/// Shared between a [`Timeout`](crate::Timeout) future and the queue.
pub(crate) struct TimerEntry {
    fired:     Cell<bool>,
    cancelled: Cell<bool>,
    waker:     RefCell<Option<Waker>>,
}

impl TimerEntry {
    pub(crate) fn new(waker: Waker) -> Rc<Self> {
        Rc::new(Self {
            fired:     Cell::new(false),
            cancelled: Cell::new(false),
            waker:     RefCell::new(Some(waker)),
        })
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.fired.get()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// The owning future was dropped before its deadline; the executor skips
    /// the entry without moving the clock to it.
    pub(crate) fn cancel(&self) {
        self.cancelled.set(true);
        self.waker.borrow_mut().take();
    }

    pub(crate) fn set_waker(&self, waker: &Waker) {
        let mut slot = self.waker.borrow_mut();
        match slot.as_ref() {
            Some(w) if w.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    pub(crate) fn fire(&self) {
        self.fired.set(true);
        let waker = self.waker.borrow_mut().take();
        if let Some(w) = waker {
            w.wake();
        }
    }
}

/// A priority queue mapping virtual instants → timers due at that instant.
#[derive(Default)]
pub(crate) struct TimerQueue {
    inner: BTreeMap<SimTime, VecDeque<(u64, Rc<TimerEntry>)>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl TimerQueue {
    /// Schedule `entry` at `at`, behind anything already due then.
    pub(crate) fn push(&mut self, at: SimTime, seq: u64, entry: Rc<TimerEntry>) {
        self.inner.entry(at).or_default().push_back((seq, entry));
        self.total += 1;
    }

    /// Put back an entry popped by [`pop_next`](Self::pop_next) without
    /// losing its place among same-time entries.
    pub(crate) fn push_front(&mut self, at: SimTime, seq: u64, entry: Rc<TimerEntry>) {
        self.inner.entry(at).or_default().push_front((seq, entry));
        self.total += 1;
    }

    /// Instant and sequence number of the earliest entry.
    pub(crate) fn peek(&self) -> Option<(SimTime, u64)> {
        let (&at, bucket) = self.inner.first_key_value()?;
        bucket.front().map(|&(seq, _)| (at, seq))
    }

    /// Remove and return the earliest entry.
    pub(crate) fn pop_next(&mut self) -> Option<(SimTime, u64, Rc<TimerEntry>)> {
        let mut slot = self.inner.first_entry()?;
        let at = *slot.key();
        let entry = slot.get_mut().pop_front();
        if slot.get().is_empty() {
            slot.remove();
        }
        let (seq, entry) = entry?;
        self.total -= 1;
        Some((at, seq, entry))
    }

    /// The earliest instant with at least one queued timer.
    pub(crate) fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.total
    }

    pub(crate) fn clear(&mut self) {
        self.inner.clear();
        self.total = 0;
    }
}
