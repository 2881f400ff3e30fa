//! `Sim` — the virtual-time executor — and the `Env` handle processes use.
//!
//! # Step loop
//!
//! ```text
//! loop:
//!   ① Pick    — the earliest of: the head of the ready queue (due now) and
//!               the earliest pending timer.  Ties at one instant go to
//!               whichever was scheduled first.
//!   ② Poll    — a ready task is polled.
//!   ③ Fire    — a timer moves the clock to its deadline and wakes its task.
//!   ④ Stop    — nothing is ready, and no timer remains or the next one
//!               lies past `until`.
//! ```
//!
//! Wakes and timers draw from one sequence counter.  A process woken at
//! `t` (by a released resource, a fired signal, a put) therefore runs after
//! every timeout already due at `t`, in the order they were scheduled.
//!
//! Processes are plain `async` blocks.  They suspend only on the futures in
//! this crate (timeouts, resource and container acquisition, store gets,
//! signals, join handles), all of which wake through the task's waker, so
//! the ready queue is the only source of progress besides timers.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use dc_core::SimTime;
use futures::task::{ArcWake, waker};
use tracing::trace;

use crate::timer::{TimerEntry, TimerQueue};

type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

// ── Task plumbing ─────────────────────────────────────────────────────────────

/// Tasks due at the current instant, tagged with their scheduling sequence.
#[derive(Default)]
struct ReadyQueue {
    queue: Mutex<VecDeque<(u64, usize)>>,
    /// Shared with the timer queue so both orders interleave.
    seq:   AtomicU64,
}

impl ReadyQueue {
    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<(u64, usize)>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, id: usize) {
        let seq = self.next_seq();
        self.lock().push_back((seq, id));
    }

    fn front_seq(&self) -> Option<u64> {
        self.lock().front().map(|&(seq, _)| seq)
    }

    fn pop(&self) -> Option<usize> {
        self.lock().pop_front().map(|(_, id)| id)
    }
}

struct TaskWaker {
    id:     usize,
    /// Set while the id sits in the ready queue so repeated wakes enqueue once.
    queued: AtomicBool,
    ready:  Arc<ReadyQueue>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if !arc_self.queued.swap(true, Ordering::AcqRel) {
            arc_self.ready.push(arc_self.id);
        }
    }
}

struct Task {
    future: Option<LocalFuture>,
    waker:  Arc<TaskWaker>,
}

struct Core {
    now:    Cell<SimTime>,
    timers: RefCell<TimerQueue>,
    tasks:  RefCell<Vec<Option<Task>>>,
    ready:  Arc<ReadyQueue>,
    live:   Cell<usize>,
    polls:  Cell<u64>,
}

impl Core {
    fn new() -> Self {
        Self {
            now:    Cell::new(SimTime::ZERO),
            timers: RefCell::new(TimerQueue::default()),
            tasks:  RefCell::new(Vec::new()),
            ready:  Arc::new(ReadyQueue::default()),
            live:   Cell::new(0),
            polls:  Cell::new(0),
        }
    }

    fn insert(&self, future: LocalFuture) {
        let id = {
            let mut tasks = self.tasks.borrow_mut();
            let id = tasks.len();
            let waker = Arc::new(TaskWaker {
                id,
                queued: AtomicBool::new(true),
                ready:  Arc::clone(&self.ready),
            });
            tasks.push(Some(Task { future: Some(future), waker }));
            id
        };
        self.live.set(self.live.get() + 1);
        self.ready.push(id);
    }

    fn poll_task(&self, id: usize) {
        let (mut future, handle) = {
            let mut tasks = self.tasks.borrow_mut();
            let Some(Some(task)) = tasks.get_mut(id) else { return };
            let Some(future) = task.future.take() else { return };
            (future, Arc::clone(&task.waker))
        };
        handle.queued.store(false, Ordering::Release);
        let waker: Waker = waker(handle);
        let mut cx = Context::from_waker(&waker);
        self.polls.set(self.polls.get() + 1);

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                if let Some(slot) = self.tasks.borrow_mut().get_mut(id) {
                    *slot = None;
                }
                self.live.set(self.live.get() - 1);
            }
            Poll::Pending => {
                if let Some(Some(task)) = self.tasks.borrow_mut().get_mut(id) {
                    task.future = Some(future);
                }
            }
        }
    }

    fn schedule(&self, at: SimTime, entry: Rc<TimerEntry>) {
        let seq = self.ready.next_seq();
        self.timers.borrow_mut().push(at, seq, entry);
    }

    /// Whether the earliest timer goes before the head of the ready queue;
    /// `None` once both are empty.
    fn timer_first(&self) -> Option<bool> {
        let timer = self.timers.borrow().peek();
        match (timer, self.ready.front_seq()) {
            (None, None) => None,
            (Some(_), None) => Some(true),
            (None, Some(_)) => Some(false),
            (Some((at, timer_seq)), Some(ready_seq)) => {
                Some(at <= self.now.get() && timer_seq < ready_seq)
            }
        }
    }

    fn advance(&self, until: Option<SimTime>) -> SimTime {
        loop {
            let Some(timer_first) = self.timer_first() else { break };
            if !timer_first {
                if let Some(id) = self.ready.pop() {
                    self.poll_task(id);
                }
                continue;
            }

            let next = self.timers.borrow_mut().pop_next();
            let Some((at, seq, entry)) = next else { break };
            if entry.is_cancelled() {
                continue;
            }
            if let Some(limit) = until {
                if at > limit {
                    self.timers.borrow_mut().push_front(at, seq, entry);
                    break;
                }
            }
            debug_assert!(at >= self.now.get(), "timer scheduled before the current instant");
            trace!(t = at.minutes(), "advance");
            self.now.set(at);
            entry.fire();
        }

        if let Some(limit) = until {
            if limit > self.now.get() {
                self.now.set(limit);
            }
        }
        self.now.get()
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// Owner of a virtual clock and every process running on it.
///
/// Dropping the `Sim` drops every still-suspended process, which releases
/// whatever resources they hold through their guards.
pub struct Sim {
    core: Rc<Core>,
}

impl Sim {
    pub fn new() -> Self {
        Self { core: Rc::new(Core::new()) }
    }

    /// A cloneable handle for processes.
    pub fn env(&self) -> Env {
        Env { core: Rc::clone(&self.core) }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.core.now.get()
    }

    /// Start a process; see [`Env::spawn`].
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.env().spawn(future)
    }

    /// Run until no process can make progress.  Returns the final instant.
    pub fn run(&mut self) -> SimTime {
        self.core.advance(None)
    }

    /// Run until the clock would pass `until`; the clock then reads `until`.
    /// Timers due later stay queued and a later call resumes them.
    pub fn run_until(&mut self, until: SimTime) -> SimTime {
        self.core.advance(Some(until))
    }

    /// Processes spawned but not yet finished.  After [`run`](Self::run)
    /// returns, any such process is blocked forever.
    pub fn live_processes(&self) -> usize {
        self.core.live.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.core.timers.borrow().len()
    }

    /// Instant of the earliest pending timer, if any.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.core.timers.borrow().next_time()
    }

    /// Total task polls so far (a rough work counter).
    pub fn polls(&self) -> u64 {
        self.core.polls.get()
    }
}

impl Default for Sim {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Sim {
    fn drop(&mut self) {
        // Suspended tasks hold `Env` clones; dropping them breaks the cycle.
        let tasks = std::mem::take(&mut *self.core.tasks.borrow_mut());
        drop(tasks);
        self.core.timers.borrow_mut().clear();
    }
}

// ── Env ───────────────────────────────────────────────────────────────────────

/// Handle to the clock for code running inside processes.
#[derive(Clone)]
pub struct Env {
    core: Rc<Core>,
}

impl Env {
    #[inline]
    pub fn now(&self) -> SimTime {
        self.core.now.get()
    }

    /// Suspend for `minutes` of virtual time.  Negative or non-finite delays
    /// are treated as zero; a zero delay still yields to every process
    /// already due at the current instant.
    pub fn timeout(&self, minutes: f64) -> Timeout {
        let delay = if minutes.is_finite() { minutes.max(0.0) } else { 0.0 };
        self.timeout_until(self.now().after(delay))
    }

    /// Suspend until the absolute instant `at` (or now, if `at` is past).
    pub fn timeout_until(&self, at: SimTime) -> Timeout {
        Timeout {
            core:     Rc::clone(&self.core),
            deadline: at.max(self.now()),
            entry:    None,
        }
    }

    /// Start a process.  It is first polled after every process already
    /// ready at this instant.  The returned handle may be awaited for the
    /// output or dropped to detach.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let slot = Rc::new(RefCell::new(JoinSlot { value: None, finished: false, waker: None }));
        let task_slot = Rc::clone(&slot);
        self.core.insert(Box::pin(async move {
            let value = future.await;
            let waker = {
                let mut s = task_slot.borrow_mut();
                s.value = Some(value);
                s.finished = true;
                s.waker.take()
            };
            if let Some(w) = waker {
                w.wake();
            }
        }));
        JoinHandle { slot }
    }
}

// ── Timeout ───────────────────────────────────────────────────────────────────

/// Future returned by [`Env::timeout`].  Resolves to the deadline.
#[must_use = "a timeout does nothing unless awaited"]
pub struct Timeout {
    core:     Rc<Core>,
    deadline: SimTime,
    entry:    Option<Rc<TimerEntry>>,
}

impl Future for Timeout {
    type Output = SimTime;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<SimTime> {
        let this = self.get_mut();
        match &this.entry {
            None => {
                let entry = TimerEntry::new(cx.waker().clone());
                this.core.schedule(this.deadline, Rc::clone(&entry));
                this.entry = Some(entry);
                Poll::Pending
            }
            Some(entry) if entry.is_fired() => Poll::Ready(this.deadline),
            Some(entry) => {
                entry.set_waker(cx.waker());
                Poll::Pending
            }
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if let Some(entry) = &self.entry {
            if !entry.is_fired() {
                entry.cancel();
            }
        }
    }
}

// ── JoinHandle ────────────────────────────────────────────────────────────────

struct JoinSlot<T> {
    value:    Option<T>,
    finished: bool,
    waker:    Option<Waker>,
}

/// Awaitable output of a spawned process.
pub struct JoinHandle<T> {
    slot: Rc<RefCell<JoinSlot<T>>>,
}

impl<T> JoinHandle<T> {
    pub fn is_finished(&self) -> bool {
        self.slot.borrow().finished
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.slot.borrow_mut();
        match slot.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
