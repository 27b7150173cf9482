use core::fmt;

use feedwindow::{FeedItem, Geometry, RowLayout};

/// Viewport events a container reports to the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewportEvent {
    Scroll,
    Wheel,
    TouchStart,
}

impl ViewportEvent {
    /// Every event the binder subscribes to.
    pub const ALL: [Self; 3] = [Self::Scroll, Self::Wheel, Self::TouchStart];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Wheel => "wheel",
            Self::TouchStart => "touchstart",
        }
    }

    /// Wheel and touch input mark the next scroll as user-initiated.
    pub fn is_gesture(self) -> bool {
        matches!(self, Self::Wheel | Self::TouchStart)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// The listener never cancels the event's default action.
    pub passive: bool,
}

/// Something viewport listeners can be attached to.
pub trait ListenerTarget {
    /// Identifies the underlying container so rebinding the same one can be detected.
    type ContainerId: PartialEq + fmt::Debug;
    /// A handle returned by `add_listener`, used to detach it again.
    type Listener;

    fn container_id(&self) -> Self::ContainerId;
    fn add_listener(&mut self, event: ViewportEvent, options: ListenerOptions) -> Self::Listener;
    fn remove_listener(&mut self, listener: Self::Listener);
}

/// A scroll container that renders a feed's items.
///
/// The container reports row geometry through its [`RowLayout`] supertrait.
pub trait ScrollContainer<T: FeedItem>: ListenerTarget + RowLayout<T::Id> {
    fn geometry(&self) -> Geometry;
    fn set_scroll_top(&mut self, scroll_top: f64);
    /// Renders `items` in display order (ascending by key).
    fn render(&mut self, items: &[T]);
}

/// The result of [`EventBinder::bind`].
#[derive(Debug)]
pub enum BindOutcome<C> {
    /// The same container was already bound; nothing changed.
    Unchanged,
    /// A container was bound where none was before.
    Attached,
    /// The previous container was released and a new one bound.
    Replaced(C),
    /// The previous container was released and nothing is bound now.
    Released(C),
    /// Nothing was bound before or after.
    Idle,
}

impl<C> BindOutcome<C> {
    /// `true` when a (different) container is now bound.
    pub fn is_new_binding(&self) -> bool {
        matches!(self, Self::Attached | Self::Replaced(_))
    }
}

/// Owns a bound container together with the listeners attached to it.
///
/// At most one container is bound at a time. Binding a different container detaches every
/// listener from the previous one first.
pub struct EventBinder<C: ListenerTarget> {
    container: Option<C>,
    listeners: Vec<C::Listener>,
}

impl<C: ListenerTarget> Default for EventBinder<C> {
    fn default() -> Self {
        Self {
            container: None,
            listeners: Vec::new(),
        }
    }
}

impl<C: ListenerTarget> fmt::Debug for EventBinder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinder")
            .field("container", &self.container.as_ref().map(C::container_id))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<C: ListenerTarget> EventBinder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.container.is_some()
    }

    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> Option<&mut C> {
        self.container.as_mut()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Binds `container` (or unbinds, for `None`).
    ///
    /// Rebinding a container with the same id is a no-op and drops the passed duplicate.
    pub fn bind(&mut self, container: Option<C>) -> BindOutcome<C> {
        if let (Some(current), Some(next)) = (&self.container, &container) {
            if current.container_id() == next.container_id() {
                return BindOutcome::Unchanged;
            }
        }

        let previous = self.release();
        let Some(mut container) = container else {
            return match previous {
                Some(prev) => BindOutcome::Released(prev),
                None => BindOutcome::Idle,
            };
        };

        let options = ListenerOptions { passive: true };
        self.listeners = ViewportEvent::ALL
            .iter()
            .map(|&event| container.add_listener(event, options))
            .collect();
        fdebug!(
            container = ?container.container_id(),
            listeners = self.listeners.len(),
            "bind"
        );
        self.container = Some(container);

        match previous {
            Some(prev) => BindOutcome::Replaced(prev),
            None => BindOutcome::Attached,
        }
    }

    /// Detaches all listeners and returns the released container.
    pub fn release(&mut self) -> Option<C> {
        let mut container = self.container.take()?;
        let listeners = core::mem::take(&mut self.listeners);
        fdebug!(
            container = ?container.container_id(),
            listeners = listeners.len(),
            "release"
        );
        for listener in listeners {
            container.remove_listener(listener);
        }
        Some(container)
    }
}
