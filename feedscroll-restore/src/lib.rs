//! Scroll-position persistence and restoration for `feedscroll` feeds.
//!
//! `feedscroll` knows nothing about routes or sessions. This crate remembers where the user was
//! in each scroll context and brings them back there when the context becomes active again:
//!
//! - [`ScrollPositionStore`]: keyed positions with expiry, written through to a
//!   [`DurableStorage`] backend as one versioned JSON document
//! - [`RestoreCoordinator`]: saves while the user scrolls and restores on activation, retrying
//!   with backoff while the feed is still loading
//!
//! Both are headless and clock-free: the adapter passes `now_ms` into every call and scrolls
//! through a [`ScrollSurface`]. [`feedscroll::FeedVirtualizer`] is a `ScrollSurface`.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod coordinator;
mod error;
mod key;
mod options;
mod storage;
mod store;
mod surface;


pub use coordinator::{RestoreCoordinator, RestoreOutcome, RestorePhase};
pub use error::{Result, StorageError};
pub use key::{SUB_KEY_SEPARATOR, ScrollKey};
pub use options::RestoreOptions;
pub use storage::{DurableStorage, FileStorage, MemoryStorage, UnavailableStorage};
pub use store::{
    CURRENT_VERSION, DEFAULT_NAMESPACE, DEFAULT_RETENTION_MS, ScrollPositionStore, ScrollRecord,
    StoreOptions,
};
pub use surface::{RestoreToken, ScrollBehavior, ScrollCommand, ScrollSurface};
