use core::fmt::Debug;

/// The identity bound for feed items.
///
/// With `std`, identities are hashed (`Hash + Eq`). Without `std`, they are ordered (`Ord`) so the
/// core can fall back to `BTreeSet`-style lookups.
#[cfg(feature = "std")]
pub trait ItemIdentity: core::hash::Hash + Eq + Clone + Debug {
    /// Explicit identity comparison. Items are never matched structurally.
    fn same_item(&self, other: &Self) -> bool {
        self == other
    }
}
#[cfg(feature = "std")]
impl<T: core::hash::Hash + Eq + Clone + Debug> ItemIdentity for T {}

#[cfg(not(feature = "std"))]
pub trait ItemIdentity: Ord + Clone + Debug {
    /// Explicit identity comparison. Items are never matched structurally.
    fn same_item(&self, other: &Self) -> bool {
        self == other
    }
}
#[cfg(not(feature = "std"))]
impl<T: Ord + Clone + Debug> ItemIdentity for T {}

/// A record supplied by the external live query.
///
/// `key` orders the feed (typically a timestamp) and `id` identifies the record across requeries.
/// The core never creates or mutates items.
pub trait FeedItem: Clone {
    type Key: Ord + Copy + Debug;
    type Id: ItemIdentity;

    fn key(&self) -> Self::Key;
    fn id(&self) -> Self::Id;
}

#[cfg(feature = "std")]
pub(crate) type IdSet<Id> = std::collections::HashSet<Id>;
#[cfg(not(feature = "std"))]
pub(crate) type IdSet<Id> = alloc::collections::BTreeSet<Id>;
