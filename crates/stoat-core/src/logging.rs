//! Logging shim.
//!
//! With the `tracing` feature the macros are `tracing`'s own. Without it they
//! expand to nothing, so call sites never need a `cfg`.
//!
//! The no-op macros are defined under `*_event` names and re-exported under
//! the `tracing` names: a `macro_rules! warn` would be ambiguous with the
//! built-in `#[warn]` attribute.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! debug_event {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_event {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug_event as debug, trace_event as trace, warn_event as warn};
