//! Bounded pool of a fungible integer quantity.
//!
//! `get(k)` blocks until `k` units are available and then takes all of them
//! at once; partial grants never happen.  Waiters are served strictly in
//! arrival order: a large request at the head blocks smaller ones behind it
//! until it is satisfied.  `put(k)` never blocks.
//!
//! Invariant: `0 <= level <= capacity`.  A `put` that would overfill the
//! pool, or a `get` larger than the capacity, is a logic error and panics.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

struct Demand {
    amount:  u32,
    granted: Cell<bool>,
    waker:   RefCell<Option<Waker>>,
}

struct ContainerState {
    capacity: u32,
    level:    u32,
    waiting:  VecDeque<Rc<Demand>>,
}

impl ContainerState {
    fn grant(&mut self) -> Vec<Waker> {
        let mut woken = Vec::new();
        while let Some(head) = self.waiting.front() {
            if head.amount > self.level {
                break;
            }
            self.level -= head.amount;
            head.granted.set(true);
            if let Some(w) = head.waker.borrow_mut().take() {
                woken.push(w);
            }
            self.waiting.pop_front();
        }
        woken
    }
}

struct ContainerInner {
    name:  String,
    state: RefCell<ContainerState>,
}

/// Shared handle to a bounded quantity pool.
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    /// A full container.
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self::with_level(name, capacity, capacity)
    }

    pub fn with_level(name: impl Into<String>, capacity: u32, level: u32) -> Self {
        let name = name.into();
        assert!(level <= capacity, "container `{name}` initial level {level} exceeds capacity {capacity}");
        Self {
            inner: Rc::new(ContainerInner {
                name,
                state: RefCell::new(ContainerState { capacity, level, waiting: VecDeque::new() }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Units currently available.
    pub fn level(&self) -> u32 {
        self.inner.state.borrow().level
    }

    pub fn capacity(&self) -> u32 {
        self.inner.state.borrow().capacity
    }

    /// Requests waiting for units.
    pub fn waiting(&self) -> usize {
        self.inner.state.borrow().waiting.len()
    }

    /// Take `amount` units, waiting as long as necessary.
    ///
    /// # Panics
    /// If `amount` exceeds the capacity (the request could never be served).
    pub fn get(&self, amount: u32) -> ContainerGet {
        let capacity = self.capacity();
        assert!(
            amount <= capacity,
            "container `{}`: request for {amount} can never be served (capacity {capacity})",
            self.inner.name
        );
        ContainerGet { container: self.clone(), amount, demand: None }
    }

    /// Take `amount` units and hand back a lease that returns them on drop.
    pub fn lease(&self, amount: u32) -> Lease {
        Lease { get: self.get(amount) }
    }

    /// Return `amount` units.
    ///
    /// # Panics
    /// If the level would exceed the capacity.
    pub fn put(&self, amount: u32) {
        let wakers = {
            let mut st = self.inner.state.borrow_mut();
            let level = st.level + amount;
            assert!(
                level <= st.capacity,
                "container `{}` overfilled: {} + {amount} > {}",
                self.inner.name,
                st.level,
                st.capacity
            );
            st.level = level;
            st.grant()
        };
        for w in wakers {
            w.wake();
        }
    }
}

/// Future returned by [`Container::get`].
#[must_use = "a request does nothing unless awaited"]
pub struct ContainerGet {
    container: Container,
    amount:    u32,
    demand:    Option<Rc<Demand>>,
}

impl Future for ContainerGet {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.demand.is_none() {
            let demand = Rc::new(Demand {
                amount:  this.amount,
                granted: Cell::new(false),
                waker:   RefCell::new(None),
            });
            let wakers = {
                let mut st = this.container.inner.state.borrow_mut();
                st.waiting.push_back(Rc::clone(&demand));
                st.grant()
            };
            for w in wakers {
                w.wake();
            }
            this.demand = Some(demand);
        }

        let granted = this.demand.as_ref().is_some_and(|d| d.granted.get());
        if granted {
            this.demand = None;
            return Poll::Ready(());
        }
        if let Some(demand) = &this.demand {
            *demand.waker.borrow_mut() = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl Drop for ContainerGet {
    fn drop(&mut self) {
        let Some(demand) = self.demand.take() else { return };
        if demand.granted.get() {
            self.container.put(demand.amount);
            return;
        }
        let wakers = {
            let mut st = self.container.inner.state.borrow_mut();
            st.waiting.retain(|d| !Rc::ptr_eq(d, &demand));
            // Removing a blocked head may unblock the requests behind it.
            st.grant()
        };
        for w in wakers {
            w.wake();
        }
    }
}

/// Future returned by [`Container::lease`].
#[must_use = "a request does nothing unless awaited"]
pub struct Lease {
    get: ContainerGet,
}

impl Future for Lease {
    type Output = ContainerLease;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ContainerLease> {
        match Pin::new(&mut self.get).poll(cx) {
            Poll::Ready(()) => Poll::Ready(ContainerLease {
                container: self.get.container.clone(),
                amount:    self.get.amount,
            }),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Units taken from a [`Container`]; returned on drop.
#[must_use = "dropping the lease returns the units immediately"]
pub struct ContainerLease {
    container: Container,
    amount:    u32,
}

impl ContainerLease {
    pub fn amount(&self) -> u32 {
        self.amount
    }
}

impl Drop for ContainerLease {
    fn drop(&mut self) {
        self.container.put(self.amount);
    }
}
