//! Unbounded FIFO hand-off queue.
//!
//! `put` never blocks.  `get` resolves immediately when an item is queued,
//! otherwise it waits; items are handed to waiting getters in the order the
//! getters arrived.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

struct Getter<T> {
    slot:  RefCell<Option<T>>,
    waker: RefCell<Option<Waker>>,
}

struct StoreState<T> {
    items:   VecDeque<T>,
    getters: VecDeque<Rc<Getter<T>>>,
}

impl<T> StoreState<T> {
    /// Give `item` to the oldest waiting getter, or queue it at the back
    /// (`front == false`) or front (`front == true`).
    fn deliver(&mut self, item: T, front: bool) -> Option<Waker> {
        match self.getters.pop_front() {
            Some(getter) => {
                *getter.slot.borrow_mut() = Some(item);
                getter.waker.borrow_mut().take()
            }
            None => {
                if front {
                    self.items.push_front(item);
                } else {
                    self.items.push_back(item);
                }
                None
            }
        }
    }
}

/// Shared handle to a hand-off queue.
pub struct Store<T> {
    inner: Rc<RefCell<StoreState<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreState { items: VecDeque::new(), getters: VecDeque::new() })),
        }
    }

    pub fn put(&self, item: T) {
        let waker = self.inner.borrow_mut().deliver(item, false);
        if let Some(w) = waker {
            w.wake();
        }
    }

    pub fn get(&self) -> StoreGet<T> {
        StoreGet { store: self.clone(), getter: None }
    }

    /// Items queued and not yet taken.
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Getters currently waiting for an item.
    pub fn waiting_getters(&self) -> usize {
        self.inner.borrow().getters.len()
    }
}

/// Future returned by [`Store::get`].
///
/// Dropping it after an item was handed over but before it was observed
/// puts the item back at the head of the queue.
#[must_use = "a get does nothing unless awaited"]
pub struct StoreGet<T> {
    store:  Store<T>,
    getter: Option<Rc<Getter<T>>>,
}

impl<T> Future for StoreGet<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();

        match &this.getter {
            None => {
                let mut st = this.store.inner.borrow_mut();
                if let Some(item) = st.items.pop_front() {
                    return Poll::Ready(item);
                }
                let getter = Rc::new(Getter {
                    slot:  RefCell::new(None),
                    waker: RefCell::new(Some(cx.waker().clone())),
                });
                st.getters.push_back(Rc::clone(&getter));
                drop(st);
                this.getter = Some(getter);
                Poll::Pending
            }
            Some(getter) => {
                let item = getter.slot.borrow_mut().take();
                match item {
                    Some(item) => {
                        this.getter = None;
                        Poll::Ready(item)
                    }
                    None => {
                        *getter.waker.borrow_mut() = Some(cx.waker().clone());
                        Poll::Pending
                    }
                }
            }
        }
    }
}

impl<T> Drop for StoreGet<T> {
    fn drop(&mut self) {
        let Some(getter) = self.getter.take() else { return };
        let waker = {
            let mut st = self.store.inner.borrow_mut();
            st.getters.retain(|g| !Rc::ptr_eq(g, &getter));
            let item = getter.slot.borrow_mut().take();
            item.and_then(|item| st.deliver(item, true))
        };
        if let Some(w) = waker {
            w.wake();
        }
    }
}
