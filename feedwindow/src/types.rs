use core::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Track the most recent `limit` items, pinned to the tail.
    #[default]
    Live,
    /// Paginate toward older items, anchored at a key.
    Backward,
    /// Paginate toward newer items, anchored at a key.
    Forward,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Backward => "backward",
            Self::Forward => "forward",
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Live => None,
            Self::Backward => Some(Direction::Backward),
            Self::Forward => Some(Direction::Forward),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Toward older items (the top of the viewport).
    Backward,
    /// Toward newer items (the bottom of the viewport).
    Forward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backward => "backward",
            Self::Forward => "forward",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Backward => Self::Forward,
            Self::Forward => Self::Backward,
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            Self::Backward => Mode::Backward,
            Self::Forward => Mode::Forward,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Backward => 0,
            Self::Forward => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicates continuation requests for the same logical boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContinuationKey<K> {
    pub direction: Direction,
    pub anchor_key: K,
}

/// A programmatic scroll-offset assignment the host must apply to its container.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollCommand {
    pub scroll_top: f64,
}

/// What a scroll or frame observation asks the host to do next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollAction {
    #[default]
    None,
    Continue(Direction),
}

impl ScrollAction {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::None => None,
            Self::Continue(d) => Some(d),
        }
    }
}
