/// Configuration for [`crate::FeedWindow`].
///
/// Distances are expressed in fractional viewport heights ("screens") and converted to pixels
/// against the bound container's `client_height`. The `fallback_*` values apply while no
/// container is bound.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedOptions {
    /// Estimated row height, used whenever a rendered height is unavailable.
    pub min_row_px: f64,
    /// Gap from a viewport edge (in screens) below which a continuation is triggered.
    pub min_buffer_screens: f64,
    /// Distance (in screens) walked back from the trailing edge to pick an anchor.
    pub step_back_screens: f64,
    /// Height of a selection (in screens). Determines `limit` together with `min_row_px`.
    pub query_size_screens: f64,
    /// `limit` used while no container is bound.
    pub default_limit: usize,
    pub fallback_min_buffer_px: f64,
    pub fallback_step_back_px: f64,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            min_row_px: 78.0,
            min_buffer_screens: 1.0,
            step_back_screens: 1.0,
            query_size_screens: 3.0,
            default_limit: 100,
            fallback_min_buffer_px: 150.0,
            fallback_step_back_px: 240.0,
        }
    }
}

impl FeedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_row_px(mut self, min_row_px: f64) -> Self {
        self.min_row_px = min_row_px;
        self
    }

    pub fn with_min_buffer_screens(mut self, screens: f64) -> Self {
        self.min_buffer_screens = screens;
        self
    }

    pub fn with_step_back_screens(mut self, screens: f64) -> Self {
        self.step_back_screens = screens;
        self
    }

    pub fn with_query_size_screens(mut self, screens: f64) -> Self {
        self.query_size_screens = screens;
        self
    }

    pub fn with_default_limit(mut self, default_limit: usize) -> Self {
        self.default_limit = default_limit;
        self
    }

    /// Sets the thresholds used while no container is bound.
    pub fn with_fallback_thresholds(mut self, min_buffer_px: f64, step_back_px: f64) -> Self {
        self.fallback_min_buffer_px = min_buffer_px;
        self.fallback_step_back_px = step_back_px;
        self
    }
}
