#![forbid(unsafe_code)]

//! Per-store configuration.

use std::borrow::Cow;

use crate::equality::Equality;

/// Optional settings applied to a store with `with_config`.
///
/// ```
/// use stoat_core::{Equality, StoreConfig, Writable};
///
/// let ticks = Writable::new(0u64)
///     .with_config(StoreConfig::new().label("ticks").equality(Equality::Always));
/// assert_eq!(ticks.label().as_deref(), Some("ticks"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name attached to log events as the `store` field.
    pub label: Option<Cow<'static, str>>,
    /// Dirty-check policy used by `set`, `update` and notifier setters.
    pub equality: Equality,
}

impl StoreConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store label.
    #[must_use]
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the dirty-check policy.
    #[must_use]
    pub fn equality(mut self, equality: Equality) -> Self {
        self.equality = equality;
        self
    }
}
