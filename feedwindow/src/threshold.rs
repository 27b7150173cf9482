use crate::{Direction, Metrics, Mode, ScrollAction};

/// Inputs to the threshold decision, captured at a single scroll or frame observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollInput {
    pub metrics: Metrics,
    /// `scroll_top - previous scroll_top`; negative when moving up.
    pub scroll_delta: f64,
    pub mode: Mode,
    pub loading_backward: bool,
    pub loading_forward: bool,
}

impl ScrollInput {
    fn loading(&self, direction: Direction) -> bool {
        match direction {
            Direction::Backward => self.loading_backward,
            Direction::Forward => self.loading_forward,
        }
    }

    fn forward_allowed(&self) -> bool {
        // Live already tracks the tail.
        self.mode != Mode::Live && !self.loading(Direction::Forward)
    }
}

/// Decides whether a user-driven scroll should start a continuation.
///
/// Upward motion near the top continues backward; downward motion near the bottom continues
/// forward (never while `Live`). A direction that is already loading is never re-triggered.
pub fn decide_scroll(input: &ScrollInput) -> ScrollAction {
    let m = &input.metrics;
    if input.scroll_delta < 0.0
        && m.top_within_buffer()
        && !input.loading(Direction::Backward)
    {
        return ScrollAction::Continue(Direction::Backward);
    }
    if input.scroll_delta > 0.0 && m.bottom_within_buffer() && input.forward_allowed() {
        return ScrollAction::Continue(Direction::Forward);
    }
    ScrollAction::None
}

/// Decides whether to chain another continuation after one in `direction` settled.
///
/// Both gaps are re-measured, but only the settled direction is chained. This deliberately differs
/// from a recheck that falls through to the opposite edge: right after a backward page the bottom
/// gap is 0, so chaining forward would undo the page, and a window barely taller than both buffers
/// plus the viewport would oscillate between the two directions. The opposite edge waits for the
/// next user scroll.
pub fn decide_recheck(input: &ScrollInput, direction: Direction) -> ScrollAction {
    let m = &input.metrics;
    let breached = match direction {
        Direction::Backward => m.top_within_buffer(),
        Direction::Forward => m.bottom_within_buffer() && input.mode != Mode::Live,
    };
    if breached && !input.loading(direction) {
        return ScrollAction::Continue(direction);
    }
    ScrollAction::None
}
