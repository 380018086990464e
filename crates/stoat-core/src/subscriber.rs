#![forbid(unsafe_code)]

//! Subscriber callbacks and their cancellation handles.
//!
//! - [`Subscriber`]: a shared change callback, compared by identity.
//! - [`SubscriberId`]: the stable key a registration is stored under.
//! - [`Unsubscriber`]: idempotent cancellation handle returned by `subscribe`.
//! - [`SubscriptionGuard`]: RAII wrapper that cancels on drop.
//!
//! # Invariants
//!
//! 1. An `Unsubscriber` runs its action at most once, however many times
//!    `unsubscribe()` is called and on however many clones.
//! 2. The action runs with no internal borrow held, so it may freely call
//!    back into stores.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Key of one registration inside a store. Ids increase monotonically per
/// store, so ascending id order is subscription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A change callback.
///
/// Cloning shares the callback. Two `Subscriber`s are equal when they are
/// clones of each other, which is how stores deduplicate
/// [`subscribe_shared`](crate::Store::subscribe_shared) registrations.
pub struct Subscriber<T> {
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Subscriber<T> {
    pub fn new(callback: impl Fn(&T) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invoke the callback with `value`.
    pub fn notify(&self, value: &T) {
        (self.callback)(value);
    }

    /// Whether `self` and `other` are the same callback.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Subscriber<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<T> Eq for Subscriber<T> {}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("refs", &Rc::strong_count(&self.callback))
            .finish()
    }
}

type Action = Box<dyn FnOnce()>;

/// Cancels a subscription (or, when returned by a notifier, stops whatever the
/// notifier started).
///
/// Calling [`unsubscribe`](Self::unsubscribe) more than once is safe; only the
/// first call has an effect. Clones share the same action. Dropping an
/// `Unsubscriber` does **not** cancel; use [`guard`](Self::guard) for that.
#[derive(Clone)]
#[must_use = "dropping an Unsubscriber leaves the subscription active"]
pub struct Unsubscriber {
    action: Rc<RefCell<Option<Action>>>,
}

impl Unsubscriber {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Rc::new(RefCell::new(Some(Box::new(action)))),
        }
    }

    /// An unsubscriber with nothing to do.
    pub fn noop() -> Self {
        Self {
            action: Rc::new(RefCell::new(None)),
        }
    }

    /// Combine several unsubscribers into one that cancels them in order.
    pub fn all(unsubscribers: impl IntoIterator<Item = Unsubscriber>) -> Self {
        let unsubscribers: Vec<Unsubscriber> = unsubscribers.into_iter().collect();
        Self::new(move || {
            for unsubscriber in &unsubscribers {
                unsubscriber.unsubscribe();
            }
        })
    }

    pub fn unsubscribe(&self) {
        // Release the borrow before running: the action may re-enter stores
        // that hold clones of this handle.
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    /// `false` once the action has run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.action.borrow().is_some()
    }

    /// Wrap in a guard that unsubscribes when dropped.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { inner: Some(self) }
    }
}

impl fmt::Debug for Unsubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscriber")
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII guard: unsubscribes on drop.
#[derive(Debug)]
#[must_use = "dropping a SubscriptionGuard unsubscribes immediately"]
pub struct SubscriptionGuard {
    inner: Option<Unsubscriber>,
}

impl SubscriptionGuard {
    /// Give up the guard without unsubscribing.
    pub fn release(mut self) -> Unsubscriber {
        self.inner.take().unwrap_or_else(Unsubscriber::noop)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn unsubscribe_runs_once() {
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let unsub = Unsubscriber::new(move || c.set(c.get() + 1));

        assert!(unsub.is_active());
        unsub.unsubscribe();
        unsub.unsubscribe();
        assert_eq!(calls.get(), 1);
        assert!(!unsub.is_active());
    }

    #[test]
    fn clones_share_the_action() {
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let a = Unsubscriber::new(move || c.set(c.get() + 1));
        let b = a.clone();

        b.unsubscribe();
        a.unsubscribe();
        assert_eq!(calls.get(), 1);
        assert!(!a.is_active());
    }

    #[test]
    fn noop_is_inactive() {
        let unsub = Unsubscriber::noop();
        assert!(!unsub.is_active());
        unsub.unsubscribe();
    }

    #[test]
    fn all_cancels_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let parts = (0..3).map(|i| {
            let log = Rc::clone(&log);
            Unsubscriber::new(move || log.borrow_mut().push(i))
        });
        let combined = Unsubscriber::all(parts);
        combined.unsubscribe();
        combined.unsubscribe();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        {
            let _guard = Unsubscriber::new(move || c.set(c.get() + 1)).guard();
            assert_eq!(calls.get(), 0);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn released_guard_does_not_unsubscribe() {
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let guard = Unsubscriber::new(move || c.set(c.get() + 1)).guard();
        let unsub = guard.release();
        assert_eq!(calls.get(), 0);
        unsub.unsubscribe();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn subscriber_identity() {
        let a: Subscriber<i32> = Subscriber::new(|_| {});
        let b = a.clone();
        let c: Subscriber<i32> = Subscriber::new(|_| {});
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn subscriber_notify_passes_value() {
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let sub = Subscriber::new(move |v: &i32| s.set(*v));
        sub.notify(&7);
        assert_eq!(seen.get(), 7);
    }
}
