#![forbid(unsafe_code)]

//! The store contract and the shared state behind every store flavor.
//!
//! # Design
//!
//! All three store types ([`Writable`](crate::Writable),
//! [`Readable`](crate::Readable), [`Derived`](crate::Derived)) sit on a
//! [`Core<T>`]: an `Rc<RefCell<..>>` holding the value, the subscriber map,
//! the lifecycle notifier and its stop hook. Cloning a handle shares the core.
//!
//! # Invariants
//!
//! 1. Every `subscribe` delivers exactly one immediate notification carrying
//!    the value at subscribe time.
//! 2. The notifier runs exactly once per 0→1 subscriber transition; the stop
//!    hook it returned runs exactly once on the matching 1→0 transition.
//!    `stop` is `Some` only while the subscriber map is non-empty.
//! 3. A dirty write notifies a snapshot of the subscribers taken after the
//!    value was stored, in subscription order. Subscribing or unsubscribing
//!    during delivery takes effect on the next write.
//! 4. No `RefCell` borrow is held while user code (subscribers, notifiers,
//!    stop hooks, combinators) runs, so reentrant calls never panic.
//! 5. `version` increments exactly once per accepted write.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: the panic propagates out of `set`; subscribers
//!   later in the snapshot are not notified for that write. The stored value
//!   is already updated.
//! - **Store dropped while live**: the stop hook runs from `Drop`, releasing
//!   whatever the notifier acquired. Outstanding [`Setter`]s and
//!   [`Unsubscriber`]s become no-ops.

use std::any::type_name;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::StoreConfig;
use crate::derived::Derived;
use crate::equality::{Comparator, Equality};
use crate::error::{Operation, Result, StoreError, StoreKind};
use crate::logging::{debug, trace, warn};
use crate::subscriber::{Subscriber, SubscriberId, Unsubscriber};

/// Lifecycle hook run when a store gains its first subscriber.
///
/// It receives the store's internal [`Setter`]. The returned [`Unsubscriber`]
/// (if any) is the stop hook, run when the last subscriber leaves.
pub type Notifier<T> = Rc<dyn Fn(Setter<T>) -> Option<Unsubscriber>>;

/// Read-and-subscribe contract shared by every store.
///
/// Writes through [`try_set`](Self::try_set) / [`try_update`](Self::try_update)
/// fail with [`StoreError::UnsupportedOperation`] unless the store is a
/// [`Writable`](crate::Writable).
pub trait Store: Clone + 'static {
    type Value: Clone + 'static;

    fn kind(&self) -> StoreKind;

    /// Clone of the current value.
    fn get(&self) -> Self::Value;

    /// Run `f` against the current value without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same store or changes its subscribers
    /// (`subscribe`, `subscribe_shared`, or running one of its
    /// [`Unsubscriber`]s). Reads such as `get` are fine.
    fn with<R>(&self, f: impl FnOnce(&Self::Value) -> R) -> R;

    /// Register a shared callback. Registering the same [`Subscriber`] twice
    /// keeps a single registration; both returned handles cancel it.
    fn subscribe_shared(&self, subscriber: &Subscriber<Self::Value>) -> Unsubscriber;

    /// Register `callback`, invoke it once with the current value, and return
    /// the handle that cancels the registration.
    fn subscribe(&self, callback: impl Fn(&Self::Value) + 'static) -> Unsubscriber {
        self.subscribe_shared(&Subscriber::new(callback))
    }

    /// Number of registered subscribers.
    fn subscriber_count(&self) -> usize;

    fn try_set(&self, _value: Self::Value) -> Result<()> {
        Err(reject(self.kind(), Operation::Set))
    }

    fn try_update(&self, _f: impl FnOnce(&Self::Value) -> Self::Value) -> Result<()> {
        Err(reject(self.kind(), Operation::Update))
    }

    /// A [`Derived`] store applying `f` to this store's value.
    fn pipe<U, F>(&self, f: F) -> Derived<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(Self::Value) -> U + 'static,
    {
        crate::pipe::pipe(self, f)
    }
}

fn reject(kind: StoreKind, operation: Operation) -> StoreError {
    warn!(message = "store.unsupported", kind = %kind, operation = %operation);
    StoreError::unsupported(kind, operation)
}

// ---------------------------------------------------------------------------
// Core<T>
// ---------------------------------------------------------------------------

struct Inner<T> {
    value: T,
    subscribers: BTreeMap<SubscriberId, Subscriber<T>>,
    next_id: u64,
    start: Option<Notifier<T>>,
    stop: Option<Unsubscriber>,
    is_dirty: Comparator<T>,
    version: u64,
    label: Option<Cow<'static, str>>,
}

impl<T> Inner<T> {
    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or_default()
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.unsubscribe();
        }
    }
}

/// Shared state behind a store handle.
pub(crate) struct Core<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Core<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Core<T> {
    pub(crate) fn new(value: T, start: Option<Notifier<T>>) -> Self
    where
        T: PartialEq,
    {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                subscribers: BTreeMap::new(),
                next_id: 0,
                start,
                stop: None,
                is_dirty: Equality::Safe.comparator(),
                version: 0,
                label: None,
            })),
        }
    }

    pub(crate) fn configure(&self, config: StoreConfig)
    where
        T: PartialEq,
    {
        let mut inner = self.inner.borrow_mut();
        inner.is_dirty = config.equality.comparator();
        inner.label = config.label;
    }

    pub(crate) fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    pub(crate) fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    pub(crate) fn label(&self) -> Option<Cow<'static, str>> {
        self.inner.borrow().label.clone()
    }

    pub(crate) fn setter(&self) -> Setter<T> {
        Setter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn subscribe(&self, subscriber: &Subscriber<T>) -> Unsubscriber {
        let (id, start) = {
            let mut inner = self.inner.borrow_mut();
            let existing = inner
                .subscribers
                .iter()
                .find_map(|(id, s)| s.same(subscriber).then_some(*id));
            match existing {
                Some(id) => (id, None),
                None => {
                    let id = SubscriberId::new(inner.next_id);
                    inner.next_id += 1;
                    inner.subscribers.insert(id, subscriber.clone());
                    let first = inner.subscribers.len() == 1;
                    (id, first.then(|| inner.start.clone()))
                }
            }
        };

        if let Some(start) = start {
            self.start(start);
        }

        let value = self.get();
        subscriber.notify(&value);

        let weak = Rc::downgrade(&self.inner);
        Unsubscriber::new(move || {
            if let Some(inner) = weak.upgrade() {
                Core { inner }.unsubscribe(id);
            }
        })
    }

    /// Run the notifier. Until it returns, `stop` is `None`, so setter writes
    /// made from inside the notifier update the value without notifying.
    fn start(&self, notifier: Option<Notifier<T>>) {
        debug!(message = "store.start", store = self.inner.borrow().name());
        let stop = match notifier {
            Some(notifier) => notifier(self.setter()).unwrap_or_else(Unsubscriber::noop),
            None => Unsubscriber::noop(),
        };
        self.inner.borrow_mut().stop = Some(stop);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        let stop = {
            let mut inner = self.inner.borrow_mut();
            if inner.subscribers.remove(&id).is_none() || !inner.subscribers.is_empty() {
                return;
            }
            debug!(message = "store.stop", store = inner.name());
            inner.stop.take()
        };
        if let Some(stop) = stop {
            stop.unsubscribe();
        }
    }

    /// Store `value` if it is dirty and notify. Returns whether it was stored.
    pub(crate) fn set(&self, value: T) -> bool {
        let snapshot: Vec<Subscriber<T>> = {
            let mut inner = self.inner.borrow_mut();
            if !(inner.is_dirty)(&inner.value, &value) {
                return false;
            }
            inner.value = value;
            inner.version += 1;
            if inner.stop.is_none() {
                return true;
            }
            trace!(
                message = "store.notify",
                store = inner.name(),
                version = inner.version,
                subscribers = inner.subscribers.len()
            );
            inner.subscribers.values().cloned().collect()
        };

        let value = self.get();
        for subscriber in &snapshot {
            subscriber.notify(&value);
        }
        true
    }

    pub(crate) fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let current = self.get();
        self.set(f(&current))
    }

    pub(crate) fn fmt_display(&self, kind: StoreKind, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        T: fmt::Debug,
    {
        let inner = self.inner.borrow();
        write!(
            f,
            "{}<{}> {}: {:?}",
            kind.tag(),
            inner.subscribers.len(),
            short_type_name(type_name::<T>()),
            inner.value
        )
    }

    pub(crate) fn fmt_debug(&self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        T: fmt::Debug,
    {
        let inner = self.inner.borrow();
        f.debug_struct(name)
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .field("version", &inner.version)
            .field("label", &inner.label)
            .finish()
    }
}

/// `type_name` with module paths dropped from every segment:
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
fn short_type_name(full: &str) -> String {
    fn push_last(out: &mut String, path: &str) {
        out.push_str(path.rsplit("::").next().unwrap_or(path));
    }

    let mut out = String::with_capacity(full.len());
    let mut start = 0;
    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | '(' | ')' | '[' | ']' | ';' | '&' | '*' | ' ') {
            push_last(&mut out, &full[start..i]);
            out.push(c);
            start = i + c.len_utf8();
        }
    }
    push_last(&mut out, &full[start..]);
    out
}

// ---------------------------------------------------------------------------
// Setter<T>
// ---------------------------------------------------------------------------

/// The internal setter handed to a [`Notifier`].
///
/// Applies the store's dirty check exactly like a public write. Holds a weak
/// reference: once every handle to the store is gone, writes are ignored.
pub struct Setter<T> {
    inner: Weak<RefCell<Inner<T>>>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("attached", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + 'static> Setter<T> {
    pub fn set(&self, value: T) {
        if let Some(inner) = self.inner.upgrade() {
            Core { inner }.set(value);
        }
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        if let Some(inner) = self.inner.upgrade() {
            Core { inner }.update(f);
        }
    }

    /// Whether the store this setter writes to still exists.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
