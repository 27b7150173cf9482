//! A headless window/mode engine for live, key-ordered feeds.
//!
//! For listener binding and an async driver over a live query, see the `feedwindow-adapter`
//! crate.
//!
//! This crate keeps a bounded, ordered slice of a continuously updating result set (a chat
//! timeline, an activity feed) in sync with a scrolling viewport. It switches between following
//! the tail (`Live`) and paginating away from it (`Backward`/`Forward`) and reconciles the scroll
//! offset around an anchor row so the viewport does not visibly jump.
//!
//! It is UI-agnostic. A host is expected to provide:
//! - viewport geometry (scroll offset, content height, visible height)
//! - user gestures (wheel/touch) and scroll events
//! - rendered row heights and offsets (`RowLayout`)
//! - a live query that can be re-selected with a [`Selection`]
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod feed;
mod key;
mod metrics;
mod options;
mod reconcile;
mod selection;
mod state;
mod threshold;
mod types;
mod window;

#[cfg(test)]
mod tests;

pub use anchor::{AnchorCandidate, RowLayout, Unmounted, select_anchor};
pub use feed::{
    Completion, ContinuationStart, ContinuationTicket, FeedWindow, LayoutAction, LiveRequest,
    SkipReason, Subscriber, SubscriptionId,
};
pub use key::{FeedItem, ItemIdentity};
pub use metrics::{Geometry, Metrics, Thresholds, compute_limit};
pub use options::FeedOptions;
pub use reconcile::Anchor;
pub use selection::{Comparison, KeyBound, Order, QueryTemplate, Selection};
pub use state::FeedState;
pub use threshold::{ScrollInput, decide_recheck, decide_scroll};
pub use types::{ContinuationKey, Direction, Mode, ScrollAction, ScrollCommand};
pub use window::{Changeset, Window};
