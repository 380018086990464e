#![forbid(unsafe_code)]

//! Stoat public facade crate.
//!
//! Re-exports [`stoat_core`]. Most programs only need the prelude:
//!
//! ```
//! use stoat::prelude::*;
//!
//! let count = writable(1);
//! let doubled = count.pipe(|v| v * 2);
//! let _live = doubled.subscribe(|v| println!("doubled = {v}")).guard();
//! count.set(4);
//! assert_eq!(doubled.get(), 8);
//! ```

pub use stoat_core::*;

pub mod prelude {
    pub use stoat_core as core;
    pub use stoat_core::{
        Derived, Readable, Setter, Store, StoreError, SubscriptionGuard, Unsubscriber, Writable,
        derived, readable, writable,
    };
}
