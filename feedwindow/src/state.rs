use crate::{Metrics, Mode};

/// A lightweight, serializable snapshot of the observable feed state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`. This is what a debug
/// overlay or a "jump to current" button typically renders from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedState {
    pub mode: Mode,
    pub loading_backward: bool,
    pub loading_forward: bool,
    pub metrics: Metrics,
    pub generation: u64,
    /// The limit of the most recently issued selection.
    pub limit: usize,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        self.loading_backward || self.loading_forward
    }

    pub fn should_auto_scroll(&self) -> bool {
        self.mode == Mode::Live
    }
}
