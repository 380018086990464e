#![forbid(unsafe_code)]

//! Single-source derivation shortcuts.
//!
//! Four spellings of the same thing, all producing a [`Derived`] over one
//! store:
//!
//! ```
//! use stoat_core::{Store, Writable, pipe};
//!
//! let n = Writable::new(3);
//!
//! let a = pipe(&n, |v| v * 2);
//! let b = n.pipe(|v| v * 2);
//! let c = n.clone() | (|v: i32| v * 2);
//! let d = stoat_core::pipe!(n, |v| v + 1, |v| v * 10);
//!
//! assert_eq!((a.get(), b.get(), c.get(), d.get()), (6, 6, 6, 40));
//! ```
//!
//! `pipe!` and `compose!` apply their functions left to right: the first
//! function sees the source value, each later one sees its predecessor's
//! output.

use std::ops::BitOr;

use crate::derived::Derived;
use crate::readable::Readable;
use crate::store::Store;
use crate::writable::Writable;

/// A [`Derived`] store whose value is `f(store value)`.
pub fn pipe<S, U, F>(store: &S, f: F) -> Derived<U>
where
    S: Store,
    U: Clone + PartialEq + 'static,
    F: Fn(S::Value) -> U + 'static,
{
    Derived::build(store.clone(), f)
}

/// `g(f(x))`.
pub fn compose<A, B, C>(f: impl Fn(A) -> B, g: impl Fn(B) -> C) -> impl Fn(A) -> C {
    move |value| g(f(value))
}

/// Identity over `store`'s value type; gives `pipe!` a typed starting point
/// so the closures it composes need no annotations.
#[doc(hidden)]
pub fn seed<S: Store>(_store: &S) -> impl Fn(S::Value) -> S::Value + use<S> {
    |value| value
}

/// Compose functions left to right: `compose!(f, g, h)` is `x -> h(g(f(x)))`.
///
/// ```
/// let f = stoat_core::compose!(|x: i32| x + 1, |x| x * 2, |x| x - 3);
/// assert_eq!(f(4), 7);
/// ```
#[macro_export]
macro_rules! compose {
    ($f:expr $(,)?) => {
        $f
    };
    ($f:expr, $g:expr $(, $rest:expr)* $(,)?) => {
        $crate::compose!($crate::compose($f, $g) $(, $rest)*)
    };
}

/// `pipe!(store, f1, f2, …)`: one [`Derived`] over `store` applying the
/// functions left to right.
#[macro_export]
macro_rules! pipe {
    ($store:expr, $($f:expr),+ $(,)?) => {{
        let store = &$store;
        let combine = $crate::pipe::seed(store);
        $(let combine = $crate::compose(combine, $f);)+
        $crate::pipe(store, combine)
    }};
}

macro_rules! impl_pipe_operator {
    ($($store:ident),+) => {$(
        impl<T, U, F> BitOr<F> for $store<T>
        where
            T: Clone + 'static,
            U: Clone + PartialEq + 'static,
            F: Fn(T) -> U + 'static,
        {
            type Output = Derived<U>;

            fn bitor(self, f: F) -> Derived<U> {
                pipe(&self, f)
            }
        }

        impl<T, U, F> BitOr<F> for &$store<T>
        where
            T: Clone + 'static,
            U: Clone + PartialEq + 'static,
            F: Fn(T) -> U + 'static,
        {
            type Output = Derived<U>;

            fn bitor(self, f: F) -> Derived<U> {
                pipe(self, f)
            }
        }
    )+};
}

impl_pipe_operator!(Writable, Readable, Derived);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::derived::derived;

    #[test]
    fn pipe_agrees_with_derived() {
        let source = Writable::new(1);
        let piped = pipe(&source, |v| v * 3 + 1);
        let direct = derived(source.clone(), |v| v * 3 + 1).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (p, d) = (Rc::clone(&seen), Rc::clone(&seen));
        let _a = piped.subscribe(move |v| p.borrow_mut().push(("pipe", *v)));
        let _b = direct.subscribe(move |v| d.borrow_mut().push(("derived", *v)));

        for value in [2, 2, 5, -1] {
            source.set(value);
            assert_eq!(piped.get(), direct.get());
        }
        let pipe_count = seen.borrow().iter().filter(|(k, _)| *k == "pipe").count();
        let derived_count = seen.borrow().iter().filter(|(k, _)| *k == "derived").count();
        assert_eq!(pipe_count, derived_count);
    }

    #[test]
    fn method_form_matches_free_function() {
        let source = Writable::new("stoat".to_string());
        let len = source.pipe(|s| s.len());
        assert_eq!(len.get(), 5);
        let _unsub = len.subscribe(|_| {});
        source.set("ferret".into());
        assert_eq!(len.get(), 6);
    }

    #[test]
    fn compose_runs_left_to_right() {
        let f = compose(|x: i32| x + 1, |x| x * 10);
        assert_eq!(f(1), 20);
        let g = crate::compose!(|s: &str| s.len(), |n| n * 2, |n: usize| n.to_string());
        assert_eq!(g("abc"), "6");
    }

    #[test]
    fn pipe_macro_needs_no_annotations() {
        let name = Writable::new("  padded ".to_string());
        let length = crate::pipe!(name, |s| s.trim().to_string(), |s| s.len());
        assert_eq!(length.get(), 6);

        let _unsub = length.subscribe(|_| {});
        name.set("x".into());
        assert_eq!(length.get(), 1);
    }

    #[test]
    fn single_function_pipe_macro() {
        let n = Writable::new(2);
        let squared = crate::pipe!(n, |v| v * v);
        assert_eq!(squared.get(), 4);
    }

    #[test]
    fn bitor_operator_on_every_store_kind() {
        let base = Writable::new(2);
        let doubled = &base | (|v: i32| v * 2);
        let plus_one = doubled.clone() | (|v: i32| v + 1);
        let ticker = Readable::new(7u8, |_| None);
        let wide = ticker | (|v: u8| u32::from(v) * 1000);

        assert_eq!(plus_one.get(), 5);
        assert_eq!(wide.get(), 7000);

        let _unsub = plus_one.subscribe(|_| {});
        base.set(10);
        assert_eq!(plus_one.get(), 21);
        assert_eq!(doubled.subscriber_count(), 1);
    }

    #[test]
    fn piped_store_releases_source_when_unused() {
        let source = Writable::new(0);
        let piped = &source | (|v: i32| v - 1);
        let unsub = piped.subscribe(|_| {});
        assert_eq!(source.subscriber_count(), 1);
        unsub.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
    }
}
