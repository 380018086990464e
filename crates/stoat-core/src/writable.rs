#![forbid(unsafe_code)]

//! Externally settable stores.
//!
//! # Usage
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use stoat_core::{Store, Writable};
//!
//! let count = Writable::new(0);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let unsubscribe = count.subscribe(move |v| sink.borrow_mut().push(*v));
//!
//! count.set(1);
//! count.update(|c| c + 1);
//! count.set(2); // unchanged: not delivered
//! unsubscribe.unsubscribe();
//! count.set(3); // nobody listening
//!
//! assert_eq!(*seen.borrow(), vec![0, 1, 2]);
//! assert_eq!(count.get(), 3);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::{Result, StoreKind};
use crate::store::{Core, Notifier, Setter, Store};
use crate::subscriber::{Subscriber, Unsubscriber};

/// A store whose value can be changed by anyone holding the handle.
///
/// Cloning a `Writable` creates a new handle to the **same** store.
pub struct Writable<T> {
    core: Core<T>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Writable<T> {
    pub fn new(value: T) -> Self {
        Self {
            core: Core::new(value, None),
        }
    }

    /// Create a store whose `start` hook runs when the first subscriber
    /// arrives. The hook may return a stop hook, run when the last
    /// subscriber leaves.
    pub fn with_notifier(
        value: T,
        start: impl Fn(Setter<T>) -> Option<Unsubscriber> + 'static,
    ) -> Self {
        let start: Notifier<T> = Rc::new(start);
        Self {
            core: Core::new(value, Some(start)),
        }
    }

    #[must_use]
    pub fn with_config(self, config: StoreConfig) -> Self {
        self.core.configure(config);
        self
    }
}

impl<T: Clone + 'static> Writable<T> {
    /// Replace the value. Subscribers are notified only if the new value is
    /// dirty relative to the current one.
    pub fn set(&self, value: T) {
        self.core.set(value);
    }

    /// `set(f(&current))`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.core.update(f);
    }

    /// Edit a copy of the value in place, then `set` it.
    ///
    /// ```
    /// use stoat_core::{Store, Writable};
    ///
    /// #[derive(Clone, PartialEq, Debug)]
    /// struct User { name: String, age: u32 }
    ///
    /// let user = Writable::new(User { name: "Ada".into(), age: 36 });
    /// user.modify(|u| u.age += 1);
    /// assert_eq!(user.with(|u| u.age), 37);
    /// ```
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.core.get();
        f(&mut next);
        self.core.set(next);
    }

    /// Number of accepted (dirty) writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.version()
    }

    #[must_use]
    pub fn label(&self) -> Option<Cow<'static, str>> {
        self.core.label()
    }
}

impl<T: Clone + 'static> Store for Writable<T> {
    type Value = T;

    fn kind(&self) -> StoreKind {
        StoreKind::Writable
    }

    fn get(&self) -> T {
        self.core.get()
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.core.with(f)
    }

    fn subscribe_shared(&self, subscriber: &Subscriber<T>) -> Unsubscriber {
        self.core.subscribe(subscriber)
    }

    fn subscriber_count(&self) -> usize {
        self.core.subscriber_count()
    }

    fn try_set(&self, value: T) -> Result<()> {
        self.set(value);
        Ok(())
    }

    fn try_update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        self.update(f);
        Ok(())
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_debug("Writable", f)
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Display for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_display(StoreKind::Writable, f)
    }
}

/// Create a [`Writable`] store.
pub fn writable<T: Clone + PartialEq + 'static>(value: T) -> Writable<T> {
    Writable::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use crate::equality::Equality;

    fn count_notifications<T: Clone + 'static>(
        store: &Writable<T>,
    ) -> (Rc<Cell<u32>>, Unsubscriber) {
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let unsub = store.subscribe(move |_| h.set(h.get() + 1));
        (hits, unsub)
    }

    #[test]
    fn get_returns_initial_value() {
        let store = writable("hello".to_string());
        assert_eq!(store.get(), "hello");
        assert_eq!(store.kind(), StoreKind::Writable);
    }

    #[test]
    fn set_notifies_only_on_change() {
        let store = Writable::new(0);
        let (hits, _unsub) = count_notifications(&store);
        assert_eq!(hits.get(), 1);

        store.set(0);
        assert_eq!(hits.get(), 1);
        store.set(1);
        assert_eq!(hits.get(), 2);
        store.set(1);
        assert_eq!(hits.get(), 2);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn update_applies_function() {
        let store = Writable::new(10);
        store.update(|v| v * 3);
        assert_eq!(store.get(), 30);
    }

    #[test]
    fn update_may_read_the_store() {
        let store = Writable::new(2);
        let handle = store.clone();
        store.update(move |v| v + handle.get());
        assert_eq!(store.get(), 4);
    }

    #[test]
    fn modify_edits_a_copy() {
        let store = Writable::new(vec![1, 2]);
        let (hits, _unsub) = count_notifications(&store);
        store.modify(|v| v.push(3));
        assert_eq!(store.get(), vec![1, 2, 3]);
        assert_eq!(hits.get(), 2);

        // No-op edit: structurally equal, so no notification.
        store.modify(|v| v.sort());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn nan_writes_are_deduplicated() {
        let store = Writable::new(f64::NAN);
        let (hits, _unsub) = count_notifications(&store);
        store.set(f64::NAN);
        assert_eq!(hits.get(), 1);
        store.set(1.5);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn plain_equality_renotifies_nan() {
        let store =
            Writable::new(f64::NAN).with_config(StoreConfig::new().equality(Equality::Plain));
        let (hits, _unsub) = count_notifications(&store);
        store.set(f64::NAN);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn try_set_succeeds_on_writable() {
        let store = Writable::new(1);
        assert_eq!(store.try_set(2), Ok(()));
        assert_eq!(store.try_update(|v| v + 1), Ok(()));
        assert_eq!(store.get(), 3);
    }

    #[test]
    fn clone_shares_state() {
        let a = Writable::new(1);
        let b = a.clone();
        b.set(9);
        assert_eq!(a.get(), 9);
        let _unsub = a.subscribe(|_| {});
        assert_eq!(b.subscriber_count(), 1);
    }

    #[test]
    fn notifier_lifecycle() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let store = Writable::with_notifier(0, move |_set| {
            l.borrow_mut().push("start");
            let l = Rc::clone(&l);
            Some(Unsubscriber::new(move || l.borrow_mut().push("stop")))
        });

        let first = store.subscribe(|_| {});
        let second = store.subscribe(|_| {});
        first.unsubscribe();
        assert_eq!(*log.borrow(), vec!["start"]);
        second.unsubscribe();
        assert_eq!(*log.borrow(), vec!["start", "stop"]);
    }

    #[test]
    fn notifier_setter_writes_through() {
        let captured: Rc<RefCell<Option<Setter<i32>>>> = Rc::new(RefCell::new(None));
        let c = Rc::clone(&captured);
        let store = Writable::with_notifier(0, move |set| {
            *c.borrow_mut() = Some(set);
            None
        });
        let (hits, _unsub) = count_notifications(&store);

        let setter = captured.borrow().clone().expect("notifier ran");
        setter.set(7);
        assert_eq!(store.get(), 7);
        assert_eq!(hits.get(), 2);
        setter.update(|v| v + 1);
        assert_eq!(store.get(), 8);
    }

    #[test]
    fn display_and_debug() {
        let store = Writable::new(5i32).with_config(StoreConfig::new().label("count"));
        let _unsub = store.subscribe(|_| {});
        assert_eq!(store.to_string(), "w<1> i32: 5");
        let dbg = format!("{store:?}");
        assert!(dbg.contains("Writable"));
        assert!(dbg.contains("count"));
    }
}
