use alloc::vec::Vec;

use crate::key::IdSet;
use crate::{FeedItem, ItemIdentity, Order, Selection};

/// A changeset delivered by the live query's subscription.
#[derive(Clone, Debug)]
pub struct Changeset<T: FeedItem> {
    pub adds: Vec<T>,
    pub removes: Vec<T::Id>,
}

impl<T: FeedItem> Default for Changeset<T> {
    fn default() -> Self {
        Self {
            adds: Vec::new(),
            removes: Vec::new(),
        }
    }
}

impl<T: FeedItem> Changeset<T> {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }
}

/// The bounded, ordered slice of items currently materialized for display.
///
/// Items are kept in *storage order*, i.e. the order of the selection that produced them.
/// Invariants (checked by [`Window::is_well_formed`]):
/// - `len() <= limit()`
/// - items are unique by identity
/// - items are ordered by key in the selection's order, and satisfy its bound
#[derive(Clone, Debug)]
pub struct Window<T: FeedItem> {
    items: Vec<T>,
    selection: Selection<T::Key>,
}

impl<T: FeedItem> Window<T> {
    pub fn new(selection: Selection<T::Key>) -> Self {
        Self {
            items: Vec::new(),
            selection,
        }
    }

    pub fn selection(&self) -> &Selection<T::Key> {
        &self.selection
    }

    pub fn limit(&self) -> usize {
        self.selection.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in selection order (descending for Live/Backward, ascending for Forward).
    pub fn storage(&self) -> &[T] {
        &self.items
    }

    /// Iterates items in display order (ascending by key) without allocations.
    pub fn for_each_display(&self, mut f: impl FnMut(&T)) {
        match self.selection.order {
            Order::Asc => self.items.iter().for_each(&mut f),
            Order::Desc => self.items.iter().rev().for_each(&mut f),
        }
    }

    /// Items in display order (ascending by key).
    pub fn display(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.items.len());
        self.for_each_display(|it| out.push(it.clone()));
        out
    }

    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|it| it.id().same_item(id))
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    /// Replaces the contents after a requery settled under `selection`.
    ///
    /// The incoming items are normalized: items outside the bound are dropped, the rest are sorted
    /// by key (stable), deduplicated by identity and truncated to `selection.limit`.
    pub fn replace(&mut self, selection: Selection<T::Key>, items: impl IntoIterator<Item = T>) {
        self.selection = selection;
        self.items.clear();
        self.items.extend(items);
        self.normalize();
    }

    /// Applies a subscription changeset. Returns `true` if the window changed.
    pub fn apply_changeset(&mut self, changeset: Changeset<T>) -> bool {
        let before = self.items.len();
        let mut changed = false;

        if !changeset.removes.is_empty() {
            let removes: IdSet<T::Id> = changeset.removes.into_iter().collect();
            self.items.retain(|it| !removes.contains(&it.id()));
            changed |= self.items.len() != before;
        }

        for item in changeset.adds {
            let id = item.id();
            if let Some(pos) = self.position(&id) {
                self.items.remove(pos);
                changed = true;
            }
            let key = item.key();
            if !self.selection.admits(&key) {
                continue;
            }
            let at = self
                .items
                .partition_point(|x| !self.selection.precedes(&key, &x.key()));
            if at >= self.selection.limit {
                continue;
            }
            self.items.insert(at, item);
            changed = true;
        }

        self.items.truncate(self.selection.limit);
        changed
    }

    pub fn is_well_formed(&self) -> bool {
        if self.items.len() > self.selection.limit {
            return false;
        }
        let mut seen = IdSet::<T::Id>::new();
        for it in &self.items {
            if !seen.insert(it.id()) || !self.selection.admits(&it.key()) {
                return false;
            }
        }
        self.items
            .windows(2)
            .all(|w| !self.selection.precedes(&w[1].key(), &w[0].key()))
    }

    fn normalize(&mut self) {
        let selection = self.selection;
        self.items.retain(|it| selection.admits(&it.key()));
        match selection.order {
            Order::Asc => self.items.sort_by_key(|a| a.key()),
            Order::Desc => self.items.sort_by(|a, b| b.key().cmp(&a.key())),
        }
        let mut seen = IdSet::<T::Id>::new();
        self.items.retain(|it| seen.insert(it.id()));
        self.items.truncate(selection.limit);
    }
}
