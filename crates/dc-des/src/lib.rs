//! `dc-des` — virtual-time process executor for the shift simulator.
//!
//! Simulated actors (trucks, checker workers, the crew manager) are plain
//! `async` blocks spawned on a single-threaded executor whose clock only
//! moves when every runnable process has suspended.
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`sim`]         | `Sim` (owner + step loop), `Env`, `Timeout`, `JoinHandle` |
//! | [`resource`]    | `Resource` — FIFO / priority slots with scoped guards     |
//! | [`container`]   | `Container` — bounded all-or-nothing quantity pool        |
//! | [`store`]       | `Store` — unbounded blocking hand-off queue               |
//! | [`signal`]      | `Signal` — one-shot broadcast event                       |
//!
//! # Ordering guarantees
//!
//! - Processes woken at the same instant resume in wake order.
//! - Timers due at the same instant fire in the order they were scheduled.
//! - Resource and container grants are decided when slots or units are
//!   returned, never by whichever process happens to poll first.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use dc_des::{Resource, Sim};
//!
//! let mut sim = Sim::new();
//! let env = sim.env();
//! let crane = Resource::new("crane", 1);
//! sim.spawn(async move {
//!     let _slot = crane.acquire().await;
//!     env.timeout(2.5).await;
//! });
//! let end = sim.run();
//! ```

pub mod container;
pub mod resource;
pub mod signal;
pub mod sim;
pub mod store;

mod timer;

#[cfg(test)]
mod tests;

pub use container::{Container, ContainerGet, ContainerLease, Lease};
pub use resource::{Acquire, DEFAULT_PRIORITY, Resource, ResourceGuard};
pub use signal::{Signal, SignalWait};
pub use sim::{Env, JoinHandle, Sim, Timeout};
pub use store::{Store, StoreGet};
