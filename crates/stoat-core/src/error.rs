#![forbid(unsafe_code)]

//! Errors raised by misuse of the store API.
//!
//! Both kinds are programmer-usage errors: they are returned synchronously at
//! the offending call site and never alter the store's value or its
//! subscriber collection.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Which flavor of store an operation was attempted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Externally settable store.
    Writable,
    /// Store whose value changes only through its notifier's setter.
    Readable,
    /// Store computed from one or more sources.
    Derived,
}

impl StoreKind {
    /// Single-letter tag used in the `Display` form of a store.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::Writable => 'w',
            Self::Readable => 'r',
            Self::Derived => 'd',
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Writable => write!(f, "writable"),
            Self::Readable => write!(f, "readable"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// A write operation on a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Set,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid derived source: {reason}")]
    InvalidSource { reason: String },

    #[error("cannot {operation} a {kind} store")]
    UnsupportedOperation { kind: StoreKind, operation: Operation },
}

impl StoreError {
    #[must_use]
    pub fn invalid_source(reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn unsupported(kind: StoreKind, operation: Operation) -> Self {
        Self::UnsupportedOperation { kind, operation }
    }

    /// Whether this error came from writing to a store that is not writable.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}
