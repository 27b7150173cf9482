use crate::FeedOptions;

/// A snapshot of the viewport container's geometry, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl Geometry {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
            padding_top: 0.0,
            padding_bottom: 0.0,
        }
    }

    pub fn with_padding(mut self, padding_top: f64, padding_bottom: f64) -> Self {
        self.padding_top = padding_top;
        self.padding_bottom = padding_bottom;
        self
    }

    /// Distance from the viewport's top edge to the content's top edge.
    pub fn top_gap(&self) -> f64 {
        self.scroll_top
    }

    /// Distance from the viewport's bottom edge to the content's bottom edge.
    pub fn bottom_gap(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    /// The viewport height minus vertical padding.
    pub fn content_height(&self) -> f64 {
        (self.client_height - self.padding_top - self.padding_bottom).max(0.0)
    }

    /// The largest meaningful `scroll_top`.
    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    pub fn clamp_scroll_top(&self, scroll_top: f64) -> f64 {
        scroll_top.clamp(0.0, self.max_scroll_top())
    }
}

/// Pixel thresholds derived from the options and the viewport height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub min_buffer: f64,
    pub step_back: f64,
}

impl Thresholds {
    pub fn resolve(options: &FeedOptions, geometry: Option<&Geometry>) -> Self {
        match geometry {
            Some(g) => Self {
                min_buffer: options.min_buffer_screens * g.client_height,
                step_back: options.step_back_screens * g.client_height,
            },
            None => Self {
                min_buffer: options.fallback_min_buffer_px,
                step_back: options.fallback_step_back_px,
            },
        }
    }
}

/// Derived, ephemeral viewport metrics.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    pub top_gap: f64,
    pub bottom_gap: f64,
    pub min_buffer: f64,
    pub step_back: f64,
    pub result_count: usize,
}

impl Metrics {
    pub fn probe(geometry: &Geometry, thresholds: Thresholds, result_count: usize) -> Self {
        Self {
            top_gap: geometry.top_gap(),
            bottom_gap: geometry.bottom_gap(),
            min_buffer: thresholds.min_buffer,
            step_back: thresholds.step_back,
            result_count,
        }
    }

    pub fn top_within_buffer(&self) -> bool {
        self.top_gap < self.min_buffer
    }

    pub fn bottom_within_buffer(&self) -> bool {
        self.bottom_gap < self.min_buffer
    }
}

/// Computes the selection size: enough rows to cover `query_size_screens` viewport heights.
///
/// Returns `options.default_limit` while unbound. Never returns 0.
pub fn compute_limit(options: &FeedOptions, geometry: Option<&Geometry>) -> usize {
    let Some(g) = geometry else {
        return options.default_limit.max(1);
    };
    if options.min_row_px <= 0.0 {
        return options.default_limit.max(1);
    }
    let rows = g.content_height() * options.query_size_screens / options.min_row_px;
    ceil_to_usize(rows).max(1)
}

// `f64::ceil` is not available in `core`.
fn ceil_to_usize(x: f64) -> usize {
    if x.is_nan() || x <= 0.0 {
        return 0;
    }
    let whole = x as usize;
    if (whole as f64) < x {
        whole.saturating_add(1)
    } else {
        whole
    }
}
