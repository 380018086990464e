#![forbid(unsafe_code)]

//! Stores whose value changes only through their own notifier.
//!
//! A [`Readable`] is built from an initial value and a `start` hook. The hook
//! receives the store's [`Setter`] when the first subscriber arrives; that
//! setter is the only way the value ever changes. Writes from outside through
//! [`Store::try_set`] / [`Store::try_update`] fail with
//! [`StoreError::UnsupportedOperation`](crate::StoreError::UnsupportedOperation).
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use stoat_core::{Setter, Store, readable};
//!
//! // Hand the setter out so the test can drive it, like a timer would.
//! let tick: Rc<RefCell<Option<Setter<u32>>>> = Rc::default();
//! let slot = Rc::clone(&tick);
//! let clock = readable(0u32, move |set| {
//!     *slot.borrow_mut() = Some(set);
//!     None
//! });
//!
//! let _unsub = clock.subscribe(|_| {});
//! tick.borrow().as_ref().unwrap().set(1);
//! assert_eq!(clock.get(), 1);
//! assert!(clock.try_set(5).is_err());
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::StoreKind;
use crate::store::{Core, Notifier, Setter, Store};
use crate::subscriber::{Subscriber, Unsubscriber};

/// A store that can be read and subscribed to, but not written from outside.
pub struct Readable<T> {
    core: Core<T>,
}

impl<T> Clone for Readable<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Readable<T> {
    pub fn new(value: T, start: impl Fn(Setter<T>) -> Option<Unsubscriber> + 'static) -> Self {
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

impl<T: Clone + 'static> Readable<T> {
    /// Number of accepted writes made through the setter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.version()
    }

    #[must_use]
    pub fn label(&self) -> Option<Cow<'static, str>> {
        self.core.label()
    }

    pub(crate) fn core(&self) -> &Core<T> {
        &self.core
    }
}

impl<T: Clone + 'static> Store for Readable<T> {
    type Value = T;

    fn kind(&self) -> StoreKind {
        StoreKind::Readable
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
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Readable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_debug("Readable", f)
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Display for Readable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_display(StoreKind::Readable, f)
    }
}

/// Create a [`Readable`] store driven by `start`.
pub fn readable<T: Clone + PartialEq + 'static>(
    value: T,
    start: impl Fn(Setter<T>) -> Option<Unsubscriber> + 'static,
) -> Readable<T> {
    Readable::new(value, start)
}
