use alloc::string::String;
use core::fmt::Write;

use crate::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    /// `key <= bound`
    AtMost,
    /// `key >= bound`
    AtLeast,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AtMost => "<=",
            Self::AtLeast => ">=",
        }
    }

    pub fn admits<K: Ord>(self, key: &K, bound: &K) -> bool {
        match self {
            Self::AtMost => key <= bound,
            Self::AtLeast => key >= bound,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyBound<K> {
    pub op: Comparison,
    pub key: K,
}

/// A query description: `[key <op> bound] ORDER BY key <order> LIMIT <limit>`.
///
/// The base predicate (e.g. "which room") belongs to the host; see [`QueryTemplate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection<K> {
    pub bound: Option<KeyBound<K>>,
    pub order: Order,
    pub limit: usize,
}

impl<K: Ord + Copy> Selection<K> {
    /// The most recent `limit` items, newest first.
    pub fn live(limit: usize) -> Self {
        Self {
            bound: None,
            order: Order::Desc,
            limit,
        }
    }

    /// A page extending away from the tail, starting at (and including) `anchor_key`.
    pub fn continuation(direction: Direction, anchor_key: K, limit: usize) -> Self {
        let (op, order) = match direction {
            Direction::Backward => (Comparison::AtMost, Order::Desc),
            Direction::Forward => (Comparison::AtLeast, Order::Asc),
        };
        Self {
            bound: Some(KeyBound {
                op,
                key: anchor_key,
            }),
            order,
            limit,
        }
    }

    pub fn is_live(&self) -> bool {
        self.bound.is_none() && self.order == Order::Desc
    }

    /// Whether an item with `key` satisfies the bound (ignoring `limit`).
    pub fn admits(&self, key: &K) -> bool {
        match &self.bound {
            Some(b) => b.op.admits(key, &b.key),
            None => true,
        }
    }

    /// Whether `a` sorts strictly before `b` under this selection's order.
    pub fn precedes(&self, a: &K, b: &K) -> bool {
        match self.order {
            Order::Asc => a < b,
            Order::Desc => a > b,
        }
    }
}

/// Renders selections as query text for a predicate/order/limit live query.
///
/// Positional parameters are left as `?`; the bound key (if any) is the last parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryTemplate {
    pub predicate: String,
    pub key_field: String,
}

impl QueryTemplate {
    pub fn new(predicate: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            key_field: key_field.into(),
        }
    }

    /// e.g. `room = ? AND timestamp <= ? ORDER BY timestamp DESC LIMIT 10`
    pub fn render<K>(&self, selection: &Selection<K>) -> String {
        let mut out = self.predicate.clone();
        if let Some(bound) = &selection.bound {
            if !out.is_empty() {
                out.push_str(" AND ");
            }
            let _ = write!(out, "{} {} ?", self.key_field, bound.op.as_str());
        }
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(
            out,
            "ORDER BY {} {} LIMIT {}",
            self.key_field,
            selection.order.as_str(),
            selection.limit
        );
        out
    }
}
