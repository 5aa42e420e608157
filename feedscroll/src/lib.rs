//! A headless virtualization engine for feeds of variable-height items.
//!
//! For durable scroll positions and restoration across navigation, see the
//! `feedscroll-restore` crate.
//!
//! Items in a social feed have no known height until they are rendered, and their height keeps
//! changing afterwards (images load, reply threads expand). This crate keeps:
//! - a [`HeightCache`] of measured heights, with a floored running average for the rest
//! - an [`OffsetCache`] of lazily memoized prefix sums, invalidated downstream of every change
//! - an overscanned visible range ([`compute_range`]) over those prefix sums
//! - a [`FeedVirtualizer`] tying them together with coalesced refreshes, forced remeasurement,
//!   smooth scroll-to-index, scroll-to-top and "load more" detection
//!
//! It is UI-agnostic. A DOM/TUI/GUI layer is expected to provide:
//! - viewport height and scroll offset
//! - item counts from the paginated data source
//! - per-item measurements after layout
//! - a frame tick (`on_animation_frame(now_ms)`)
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod engine;
mod height;
mod key;
mod offsets;
mod options;
mod range;
mod state;
mod tween;
mod types;

#[cfg(test)]
mod tests;

pub use engine::FeedVirtualizer;
pub use height::HeightCache;
pub use offsets::OffsetCache;
pub use options::{FeedOptions, OnChangeCallback, OnLoadMoreCallback};
pub use range::compute_range;
pub use state::FeedSnapshot;
pub use tween::{Easing, Tween};
pub use types::{Align, DataSource, ItemPlacement, VisibleRange};
