//! Capacity-limited resources with priority-ordered waiting.
//!
//! A `Resource` has `capacity` identical slots.  Requests wait in a queue
//! ordered by `(priority, arrival)`; lower priority values are served first
//! and equal priorities are served in arrival order, so a resource whose
//! callers always use the default priority is a plain FIFO resource.
//!
//! A freed slot is handed directly to the head of the queue.  A newcomer
//! never overtakes a waiter that was already granted, and priority is fixed
//! when the request is enqueued.
//!
//! Acquisition returns a [`ResourceGuard`]; dropping it releases the slot,
//! so every exit path of a process releases what it holds.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Priority used by [`Resource::acquire`].
pub const DEFAULT_PRIORITY: i32 = 0;

struct Ticket {
    granted: Cell<bool>,
    waker:   RefCell<Option<Waker>>,
}

struct ResourceState {
    capacity: usize,
    in_use:   usize,
    next_seq: u64,
    waiting:  BTreeMap<(i32, u64), Rc<Ticket>>,
    grants:   u64,
}

impl ResourceState {
    /// Hand free slots to the head of the queue; returns wakers to fire once
    /// the state borrow is released.
    fn grant(&mut self) -> Vec<Waker> {
        let mut woken = Vec::new();
        while self.in_use < self.capacity {
            let Some((_, ticket)) = self.waiting.pop_first() else { break };
            self.in_use += 1;
            self.grants += 1;
            ticket.granted.set(true);
            if let Some(w) = ticket.waker.borrow_mut().take() {
                woken.push(w);
            }
        }
        woken
    }
}

fn wake_all(wakers: Vec<Waker>) {
    for w in wakers {
        w.wake();
    }
}

struct ResourceInner {
    name:  String,
    state: RefCell<ResourceState>,
}

/// Shared handle to a capacity-limited resource.
#[derive(Clone)]
pub struct Resource {
    inner: Rc<ResourceInner>,
}

impl Resource {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Rc::new(ResourceInner {
                name:  name.into(),
                state: RefCell::new(ResourceState {
                    capacity,
                    in_use: 0,
                    next_seq: 0,
                    waiting: BTreeMap::new(),
                    grants: 0,
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Request a slot at [`DEFAULT_PRIORITY`].
    pub fn acquire(&self) -> Acquire {
        self.acquire_with_priority(DEFAULT_PRIORITY)
    }

    /// Request a slot; lower `priority` values are served first.
    pub fn acquire_with_priority(&self, priority: i32) -> Acquire {
        Acquire {
            resource: self.clone(),
            priority,
            key:      (priority, 0),
            ticket:   None,
        }
    }

    /// Change the number of slots.  Growth immediately serves waiters;
    /// shrinking never preempts holders, it only delays new grants until
    /// enough slots are released.
    pub fn set_capacity(&self, capacity: usize) {
        let wakers = {
            let mut st = self.inner.state.borrow_mut();
            st.capacity = capacity;
            st.grant()
        };
        wake_all(wakers);
    }

    pub fn capacity(&self) -> usize {
        self.inner.state.borrow().capacity
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.inner.state.borrow().in_use
    }

    /// Requests waiting for a slot.
    pub fn queue_len(&self) -> usize {
        self.inner.state.borrow().waiting.len()
    }

    /// Total slots granted since creation.
    pub fn grants(&self) -> u64 {
        self.inner.state.borrow().grants
    }

    fn release(&self) {
        let wakers = {
            let mut st = self.inner.state.borrow_mut();
            assert!(st.in_use > 0, "resource `{}` released more slots than it granted", self.inner.name);
            st.in_use -= 1;
            st.grant()
        };
        wake_all(wakers);
    }
}

/// Future returned by [`Resource::acquire`].
///
/// Dropping it before completion withdraws the request (or returns the slot
/// if it had already been granted).
#[must_use = "a request does nothing unless awaited"]
pub struct Acquire {
    resource: Resource,
    priority: i32,
    key:      (i32, u64),
    ticket:   Option<Rc<Ticket>>,
}

impl Future for Acquire {
    type Output = ResourceGuard;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ResourceGuard> {
        let this = self.get_mut();

        if this.ticket.is_none() {
            let ticket = Rc::new(Ticket { granted: Cell::new(false), waker: RefCell::new(None) });
            let wakers = {
                let mut st = this.resource.inner.state.borrow_mut();
                this.key = (this.priority, st.next_seq);
                st.next_seq += 1;
                st.waiting.insert(this.key, Rc::clone(&ticket));
                st.grant()
            };
            wake_all(wakers);
            this.ticket = Some(ticket);
        }

        let granted = this.ticket.as_ref().is_some_and(|t| t.granted.get());
        if granted {
            this.ticket = None;
            return Poll::Ready(ResourceGuard { resource: this.resource.clone() });
        }
        if let Some(ticket) = &this.ticket {
            *ticket.waker.borrow_mut() = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else { return };
        if ticket.granted.get() {
            self.resource.release();
        } else {
            self.resource.inner.state.borrow_mut().waiting.remove(&self.key);
        }
    }
}

/// A held slot.  Released on drop.
#[must_use = "dropping the guard releases the slot immediately"]
pub struct ResourceGuard {
    resource: Resource,
}

impl ResourceGuard {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.resource.release();
    }
}
