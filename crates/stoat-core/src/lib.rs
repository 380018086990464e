#![forbid(unsafe_code)]

//! Svelte-style reactive stores.
//!
//! - [`Writable`]: a value anyone holding the handle can `set` or `update`.
//! - [`Readable`]: a value that changes only through the [`Setter`] handed to
//!   its start notifier.
//! - [`Derived`]: a value computed from one or more source stores, kept in
//!   sync while it has subscribers.
//! - [`pipe`] / [`compose`] (and the [`pipe!`] / [`compose!`] macros): build a
//!   single-source `Derived` from a chain of functions.
//!
//! # Architecture
//!
//! Every store is an `Rc<RefCell<..>>` handle; cloning a handle shares the
//! store. Notification is synchronous: `set` returns after every subscriber
//! has seen the new value. A store runs its start notifier when its first
//! subscriber arrives and the returned stop hook when its last one leaves, so
//! a `Derived` holds subscriptions on its sources only while it is observed.
//!
//! # Invariants
//!
//! 1. `subscribe` invokes the callback once, immediately, with the current
//!    value.
//! 2. A write notifies only when [`safe_not_equal`] (or the configured
//!    [`Equality`]) reports the value dirty.
//! 3. Subscribers are notified in subscription order.
//! 4. Unsubscribing is idempotent.
//!
//! # Example
//!
//! ```
//! use stoat_core::{Store, derived, writable};
//!
//! let a = writable(2);
//! let b = writable(3);
//! let sum = derived((a.clone(), b.clone()), |(x, y)| x + y).unwrap();
//!
//! let unsubscribe = sum.subscribe(|v| println!("sum = {v}"));
//! a.set(5); // prints "sum = 8"
//! b.set(3); // unchanged: prints nothing
//! unsubscribe.unsubscribe();
//! ```
//!
//! # Feature Flags
//!
//! - `tracing`: emit `store.start`, `store.stop`, `store.notify`,
//!   `derived.recompute` and `store.unsupported` events through the
//!   `tracing` crate.

pub mod config;
pub mod derived;
pub mod equality;
pub mod error;
mod logging;
pub mod pipe;
pub mod readable;
pub mod store;
pub mod subscriber;
pub mod writable;

pub use config::StoreConfig;
pub use derived::{Derived, Sources, derived};
pub use equality::{Comparator, Equality, not_equal, safe_not_equal};
pub use error::{Operation, Result, StoreError, StoreKind};
pub use pipe::{compose, pipe};
pub use readable::{Readable, readable};
pub use store::{Notifier, Setter, Store};
pub use subscriber::{SubscriberId, Subscriber, SubscriptionGuard, Unsubscriber};
pub use writable::{Writable, writable};
