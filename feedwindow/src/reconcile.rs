use core::fmt;

use crate::{AnchorCandidate, FeedItem, RowLayout};

/// A captured anchor: the item's identity and its offset relative to the parent before the window
/// contents change.
#[derive(Clone, PartialEq)]
pub struct Anchor<Id, K> {
    pub id: Id,
    pub key: K,
    pub offset_before: f64,
}

impl<Id: fmt::Debug, K: fmt::Debug> fmt::Debug for Anchor<Id, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("offset_before", &self.offset_before)
            .finish()
    }
}

impl<Id, K> Anchor<Id, K> {
    /// Captures `id`'s current offset. Returns `None` if the row is not rendered.
    pub fn capture(id: Id, key: K, layout: &impl RowLayout<Id>) -> Option<Self> {
        let offset_before = layout.row_offset(&id)?;
        Some(Self {
            id,
            key,
            offset_before,
        })
    }

    pub fn from_candidate<T>(candidate: &AnchorCandidate<T>) -> Self
    where
        T: FeedItem<Id = Id, Key = K>,
    {
        Self {
            id: candidate.item.id(),
            key: candidate.item.key(),
            offset_before: candidate.offset,
        }
    }

    /// How far the anchor row moved (`after - before`), matched by identity.
    ///
    /// Returns `None` when the row is no longer rendered; no adjustment should be made then.
    pub fn delta(&self, layout: &impl RowLayout<Id>) -> Option<f64> {
        let after = layout.row_offset(&self.id)?;
        Some(after - self.offset_before)
    }

    /// The scroll offset that keeps the anchor at the same on-screen position.
    pub fn reconcile(&self, scroll_top: f64, layout: &impl RowLayout<Id>) -> Option<f64> {
        self.delta(layout).map(|delta| scroll_top + delta)
    }
}
