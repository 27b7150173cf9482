use crate::{Direction, FeedItem};

/// Rendered geometry for rows, keyed by item identity.
///
/// Implemented by the host's view layer (a DOM container, a TUI list, a test double). Both
/// methods return `None` for rows that are not mounted.
pub trait RowLayout<Id> {
    /// The rendered height of a row.
    fn row_height(&self, id: &Id) -> Option<f64>;

    /// The row's top edge relative to its parent's top edge.
    fn row_offset(&self, id: &Id) -> Option<f64>;
}

/// A layout with nothing mounted.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unmounted;

impl<Id> RowLayout<Id> for Unmounted {
    fn row_height(&self, _id: &Id) -> Option<f64> {
        None
    }

    fn row_offset(&self, _id: &Id) -> Option<f64> {
        None
    }
}

/// The item chosen to stay visually fixed across a continuation.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorCandidate<T> {
    pub item: T,
    /// Position in the display list.
    pub display_index: usize,
    /// Rendered offset relative to the parent.
    pub offset: f64,
    /// Height walked from the trailing edge, including the selected row.
    pub accumulated: f64,
}

/// Picks a continuation anchor from a display-ordered list (ascending by key).
///
/// Walks from the trailing edge (the last row for `Backward`, the first for `Forward`),
/// accumulating rendered heights (or `estimated_row_px` for unmounted rows) until `step_back` is
/// covered. If the list runs out first, the last row examined is used. Returns `None` for an empty
/// list, or when the selected row is not rendered.
pub fn select_anchor<T: FeedItem>(
    direction: Direction,
    display: &[T],
    layout: &impl RowLayout<T::Id>,
    estimated_row_px: f64,
    step_back: f64,
) -> Option<AnchorCandidate<T>> {
    let n = display.len();
    if n == 0 {
        return None;
    }

    let mut accumulated = 0.0f64;
    let mut selected = None;
    for step in 0..n {
        let index = match direction {
            Direction::Backward => n - 1 - step,
            Direction::Forward => step,
        };
        let id = display[index].id();
        accumulated += layout.row_height(&id).unwrap_or(estimated_row_px);
        selected = Some(index);
        if accumulated >= step_back {
            break;
        }
    }

    let index = selected?;
    let item = &display[index];
    let Some(offset) = layout.row_offset(&item.id()) else {
        fdebug!(
            direction = direction.as_str(),
            index,
            "select_anchor: selected row is not rendered"
        );
        return None;
    };
    ftrace!(
        direction = direction.as_str(),
        index,
        total = n,
        accumulated,
        step_back,
        "select_anchor"
    );
    Some(AnchorCandidate {
        item: item.clone(),
        display_index: index,
        offset,
        accumulated,
    })
}
