//! One-shot broadcast event.
//!
//! A `Signal` fires at most once, recording the instant.  Every waiter,
//! past or future, resolves to that instant.  Firing twice is a logic error
//! and panics.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use dc_core::SimTime;

#[derive(Default)]
struct SignalState {
    fired_at: Option<SimTime>,
    waiters:  Vec<Waker>,
}

#[derive(Clone, Default)]
pub struct Signal {
    inner: Rc<RefCell<SignalState>>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that has already fired at `at`.
    pub fn fired(at: SimTime) -> Self {
        let signal = Self::new();
        signal.inner.borrow_mut().fired_at = Some(at);
        signal
    }

    /// Fire the signal, waking every waiter.
    ///
    /// # Panics
    /// If the signal has already fired.
    pub fn fire(&self, at: SimTime) {
        let waiters = {
            let mut st = self.inner.borrow_mut();
            if let Some(previous) = st.fired_at {
                panic!("signal fired twice (first at {previous}, again at {at})");
            }
            st.fired_at = Some(at);
            std::mem::take(&mut st.waiters)
        };
        for w in waiters {
            w.wake();
        }
    }

    pub fn is_fired(&self) -> bool {
        self.inner.borrow().fired_at.is_some()
    }

    pub fn fired_at(&self) -> Option<SimTime> {
        self.inner.borrow().fired_at
    }

    pub fn wait(&self) -> SignalWait {
        SignalWait { signal: self.clone() }
    }
}

/// Future returned by [`Signal::wait`].  Resolves to the firing instant.
#[must_use = "a wait does nothing unless awaited"]
pub struct SignalWait {
    signal: Signal,
}

impl Future for SignalWait {
    type Output = SimTime;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<SimTime> {
        let mut st = self.signal.inner.borrow_mut();
        if let Some(at) = st.fired_at {
            return Poll::Ready(at);
        }
        if !st.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            st.waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
