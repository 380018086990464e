#![forbid(unsafe_code)]

//! Dirty-checking: deciding whether a write is significant enough to notify.
//!
//! # Rule
//!
//! [`safe_not_equal`] treats two values as *equal* (so the write is dropped)
//! when any of the following holds:
//!
//! 1. They are the same object (identical reference).
//! 2. `==` holds.
//! 3. Both fail self-equality, as `f64::NAN` does. Two NaN-like values are
//!    therefore equal here, unlike IEEE comparison.
//!
//! Everything else is unequal and triggers notification. Structural equality
//! is whatever the type's `PartialEq` says: two distinct `Vec`s with the same
//! contents are equal, a struct containing a NaN field is NaN-like.

use std::rc::Rc;

/// Decides whether replacing `old` with `new` is a change. `true` means dirty.
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// `true` if `new` differs from `old` under the safe not-equal rule.
#[allow(clippy::eq_op)]
#[must_use]
pub fn safe_not_equal<T: PartialEq + ?Sized>(old: &T, new: &T) -> bool {
    if std::ptr::eq(old, new) || old == new {
        return false;
    }
    !(old != old && new != new)
}

/// Plain `!=`. NaN is never equal to itself, so NaN writes always notify.
#[must_use]
pub fn not_equal<T: PartialEq + ?Sized>(old: &T, new: &T) -> bool {
    old != new
}

/// Dirty-check policy for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Equality {
    /// [`safe_not_equal`].
    #[default]
    Safe,
    /// [`not_equal`].
    Plain,
    /// Every write is dirty, even if the value did not change.
    Always,
}

impl Equality {
    /// Apply the policy to a pair of values.
    #[must_use]
    pub fn is_dirty<T: PartialEq + ?Sized>(self, old: &T, new: &T) -> bool {
        match self {
            Self::Safe => safe_not_equal(old, new),
            Self::Plain => not_equal(old, new),
            Self::Always => true,
        }
    }

    pub(crate) fn comparator<T: PartialEq + 'static>(self) -> Comparator<T> {
        match self {
            Self::Safe => Rc::new(safe_not_equal::<T>),
            Self::Plain => Rc::new(not_equal::<T>),
            Self::Always => Rc::new(|_: &T, _: &T| true),
        }
    }
}
