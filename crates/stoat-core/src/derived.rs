#![forbid(unsafe_code)]

//! Stores computed from one or more source stores.
//!
//! # Design
//!
//! A [`Derived<T>`] owns an internal [`Readable<T>`] (the *target*) seeded
//! with the combinator applied to a snapshot of its sources. The target's
//! notifier does the wiring, so source subscriptions exist exactly while the
//! derived store has at least one subscriber:
//!
//! 1. On the first subscribe it re-reads every source and pushes the result
//!    (sources may have changed since construction).
//! 2. It subscribes a recompute handler to every source. The handler ignores
//!    the value that fired and re-reads **all** sources.
//! 3. Its stop hook unsubscribes from every source.
//!
//! Because the target's setter dirty-checks, a recompute that produces an
//! unchanged value does not reach the derived store's subscribers.
//!
//! # Sources
//!
//! Anything implementing [`Sources`]: a single store, a tuple of up to six
//! stores of different value types, a `Vec` of stores, or an array of stores.
//! The combinator receives the values in the same shape and order:
//!
//! ```
//! use stoat_core::{Store, Writable, derived};
//!
//! let width = Writable::new(3);
//! let height = Writable::new(4);
//! let area = derived((width.clone(), height.clone()), |(w, h)| w * h).unwrap();
//! assert_eq!(area.get(), 12);
//!
//! let parts = vec![Writable::new(1), Writable::new(2), Writable::new(3)];
//! let total = derived(parts, |values: Vec<i32>| values.iter().sum::<i32>()).unwrap();
//! assert_eq!(total.get(), 6);
//! ```
//!
//! # Failure Modes
//!
//! - **Empty source sequence**: construction fails with
//!   [`StoreError::InvalidSource`].
//! - **Combinator panics**: during construction the panic propagates from
//!   `new`; during a recompute it propagates out of the source write that
//!   triggered it, and the derived value keeps its previous result.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError, StoreKind};
use crate::logging::trace;
use crate::readable::Readable;
use crate::store::{Setter, Store};
use crate::subscriber::{Subscriber, Unsubscriber};

/// An ordered collection of source stores a [`Derived`] can be built from.
pub trait Sources: 'static {
    /// Snapshot of every source value, in source order.
    type Values;

    /// Read every source once.
    fn values(&self) -> Self::Values;

    /// Subscribe `on_change` to every source, in order. The handler is called
    /// with no argument: the emitted value is ignored.
    fn watch(&self, on_change: &Rc<dyn Fn()>) -> Vec<Unsubscriber>;

    /// Number of source stores.
    fn count(&self) -> usize;

    /// Reject source collections a derived store cannot be built from.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

fn watch_one<S: Store>(source: &S, on_change: &Rc<dyn Fn()>) -> Unsubscriber {
    let on_change = Rc::clone(on_change);
    source.subscribe(move |_| on_change())
}

impl<S: Store> Sources for S {
    type Values = S::Value;

    fn values(&self) -> S::Value {
        self.get()
    }

    fn watch(&self, on_change: &Rc<dyn Fn()>) -> Vec<Unsubscriber> {
        vec![watch_one(self, on_change)]
    }

    fn count(&self) -> usize {
        1
    }
}

macro_rules! impl_sources_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Store),+> Sources for ($($name,)+) {
            type Values = ($($name::Value,)+);

            fn values(&self) -> Self::Values {
                ($(self.$idx.get(),)+)
            }

            fn watch(&self, on_change: &Rc<dyn Fn()>) -> Vec<Unsubscriber> {
                vec![$(watch_one(&self.$idx, on_change)),+]
            }

            fn count(&self) -> usize {
                [$(stringify!($name)),+].len()
            }
        }
    };
}

impl_sources_for_tuple!(A: 0);
impl_sources_for_tuple!(A: 0, B: 1);
impl_sources_for_tuple!(A: 0, B: 1, C: 2);
impl_sources_for_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_sources_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_sources_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

impl<S: Store> Sources for Vec<S> {
    type Values = Vec<S::Value>;

    fn values(&self) -> Self::Values {
        self.iter().map(|source| source.get()).collect()
    }

    fn watch(&self, on_change: &Rc<dyn Fn()>) -> Vec<Unsubscriber> {
        self.iter()
            .map(|source| watch_one(source, on_change))
            .collect()
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(StoreError::invalid_source("source list is empty"));
        }
        Ok(())
    }
}

impl<S: Store, const N: usize> Sources for [S; N] {
    type Values = [S::Value; N];

    fn values(&self) -> Self::Values {
        self.each_ref().map(|source| source.get())
    }

    fn watch(&self, on_change: &Rc<dyn Fn()>) -> Vec<Unsubscriber> {
        self.iter()
            .map(|source| watch_one(source, on_change))
            .collect()
    }

    fn count(&self) -> usize {
        N
    }

    fn validate(&self) -> Result<()> {
        if N == 0 {
            return Err(StoreError::invalid_source("source array is empty"));
        }
        Ok(())
    }
}

/// A store whose value is a pure function of other stores.
///
/// Cloning a `Derived` creates a new handle to the **same** store.
pub struct Derived<T> {
    target: Readable<T>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Derived<T> {
    /// Build a derived store. Fails if `sources` is an empty sequence.
    pub fn new<S, F>(sources: S, combine: F) -> Result<Self>
    where
        S: Sources,
        F: Fn(S::Values) -> T + 'static,
    {
        sources.validate()?;
        Ok(Self::build(sources, combine))
    }

    /// Build without validation; callers guarantee `sources` is non-empty.
    pub(crate) fn build<S, F>(sources: S, combine: F) -> Self
    where
        S: Sources,
        F: Fn(S::Values) -> T + 'static,
    {
        let sources = Rc::new(sources);
        let combine = Rc::new(combine);
        let initial = combine(sources.values());

        let target = Readable::new(initial, move |set: Setter<T>| {
            let sync: Rc<dyn Fn()> = {
                let sources = Rc::clone(&sources);
                let combine = Rc::clone(&combine);
                Rc::new(move || {
                    trace!(message = "derived.recompute", sources = sources.count());
                    set.set(combine(sources.values()));
                })
            };
            sync();
            Some(Unsubscriber::all(sources.watch(&sync)))
        });

        Self { target }
    }

    #[must_use]
    pub fn with_config(self, config: StoreConfig) -> Self {
        Self {
            target: self.target.with_config(config),
        }
    }
}

impl<T: Clone + 'static> Derived<T> {
    /// Number of recomputations that changed the value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.target.version()
    }

    #[must_use]
    pub fn label(&self) -> Option<Cow<'static, str>> {
        self.target.label()
    }
}

impl<T: Clone + 'static> Store for Derived<T> {
    type Value = T;

    fn kind(&self) -> StoreKind {
        StoreKind::Derived
    }

    fn get(&self) -> T {
        self.target.get()
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.target.with(f)
    }

    fn subscribe_shared(&self, subscriber: &Subscriber<T>) -> Unsubscriber {
        self.target.subscribe_shared(subscriber)
    }

    fn subscriber_count(&self) -> usize {
        self.target.subscriber_count()
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.target.core().fmt_debug("Derived", f)
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Display for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.target.core().fmt_display(StoreKind::Derived, f)
    }
}

/// Create a [`Derived`] store from `sources` and a combinator.
pub fn derived<S, T, F>(sources: S, combine: F) -> Result<Derived<T>>
where
    S: Sources,
    T: Clone + PartialEq + 'static,
    F: Fn(S::Values) -> T + 'static,
{
    Derived::new(sources, combine)
}
