use core::future::Future;
use std::collections::{HashMap, HashSet};

use feedwindow::{Changeset, FeedItem, ItemIdentity, Order, Selection};
use futures::future::ready;

use crate::LiveQuery;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryFeedError {
    #[error("feed is offline")]
    Offline,
}

/// An in-memory [`LiveQuery`] over a key-ordered store.
///
/// Mutations re-run the active selection and return the difference to the previously
/// materialized results, the way a subscription would deliver it.
#[derive(Clone, Debug)]
pub struct MemoryFeed<T: FeedItem> {
    /// Ascending by key; equal keys keep insertion order.
    store: Vec<T>,
    selection: Option<Selection<T::Key>>,
    results: Vec<T>,
    offline: bool,
    requeries: usize,
}

impl<T: FeedItem> Default for MemoryFeed<T> {
    fn default() -> Self {
        Self {
            store: Vec::new(),
            selection: None,
            results: Vec::new(),
            offline: false,
            requeries: 0,
        }
    }
}

impl<T: FeedItem> MemoryFeed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut feed = Self::new();
        for item in items {
            feed.put(item);
        }
        feed
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The active selection, if one was issued.
    pub fn selection(&self) -> Option<&Selection<T::Key>> {
        self.selection.as_ref()
    }

    /// How many times the selection was replaced successfully.
    pub fn requery_count(&self) -> usize {
        self.requeries
    }

    /// While offline, `update_selection` fails and leaves the active selection untouched.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Inserts (or replaces, by identity) an item and returns the resulting changeset.
    pub fn insert(&mut self, item: T) -> Changeset<T> {
        self.put(item);
        self.refresh()
    }

    /// Removes an item by identity and returns the resulting changeset.
    pub fn remove(&mut self, id: &T::Id) -> Changeset<T> {
        self.store.retain(|x| !x.id().same_item(id));
        self.refresh()
    }

    fn put(&mut self, item: T) {
        let id = item.id();
        self.store.retain(|x| !x.id().same_item(&id));
        let key = item.key();
        let at = self.store.partition_point(|x| x.key() <= key);
        self.store.insert(at, item);
    }

    fn run(&self, selection: &Selection<T::Key>) -> Vec<T> {
        let admitted = self.store.iter().filter(|x| selection.admits(&x.key()));
        match selection.order {
            Order::Asc => admitted.take(selection.limit).cloned().collect(),
            Order::Desc => admitted.rev().take(selection.limit).cloned().collect(),
        }
    }

    fn refresh(&mut self) -> Changeset<T> {
        let Some(selection) = self.selection else {
            return Changeset::default();
        };
        let next = self.run(&selection);
        let prev = core::mem::replace(&mut self.results, next);

        // An item whose key moved is re-added.
        let before: HashMap<T::Id, T::Key> = prev.iter().map(|x| (x.id(), x.key())).collect();
        let after: HashSet<T::Id> = self.results.iter().map(FeedItem::id).collect();
        Changeset {
            adds: self
                .results
                .iter()
                .filter(|x| before.get(&x.id()) != Some(&x.key()))
                .cloned()
                .collect(),
            removes: prev
                .iter()
                .map(FeedItem::id)
                .filter(|id| !after.contains(id))
                .collect(),
        }
    }
}

impl<T: FeedItem> LiveQuery<T> for MemoryFeed<T> {
    type Error = MemoryFeedError;

    fn items(&self) -> Vec<T> {
        self.results.clone()
    }

    fn update_selection(
        &mut self,
        selection: &Selection<T::Key>,
    ) -> impl Future<Output = Result<(), MemoryFeedError>> {
        if self.offline {
            fwarn!(limit = selection.limit, "memory feed offline");
            return ready(Err(MemoryFeedError::Offline));
        }
        self.selection = Some(*selection);
        self.results = self.run(selection);
        self.requeries += 1;
        ftrace!(len = self.results.len(), "memory feed requeried");
        ready(Ok(()))
    }
}
