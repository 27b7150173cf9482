use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use crate::{
    Anchor, Changeset, ContinuationKey, Direction, FeedItem, FeedOptions, FeedState, Geometry,
    Metrics, Mode, RowLayout, ScrollAction, ScrollCommand, ScrollInput, Selection, Thresholds,
    Window, compute_limit, decide_recheck, decide_scroll, select_anchor,
};

/// A callback fired when the observable state changes.
pub type Subscriber<T> = Arc<dyn Fn(&FeedWindow<T>) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A requery the host must issue to enter `Live`, plus the scroll-to-bottom that follows it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveRequest<K> {
    pub selection: Selection<K>,
    pub generation: u64,
    pub scroll: Option<ScrollCommand>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A continuation is already in flight in this direction.
    AlreadyLoading(Direction),
    /// No container is bound.
    Unbound,
    /// No rendered row could serve as an anchor.
    NoAnchor,
    /// The same `(direction, anchor key)` boundary was already requested.
    Duplicate,
}

/// The outcome of [`FeedWindow::begin_continuation`].
#[derive(Debug)]
pub enum ContinuationStart<T: FeedItem> {
    /// Issue `ticket.selection()` against the live query, then call
    /// [`FeedWindow::finish_continuation`] (or [`FeedWindow::abort_continuation`] on failure).
    Proceed(ContinuationTicket<T>),
    /// The window was empty; issue the live selection instead.
    EnterLive(LiveRequest<T::Key>),
    Skipped(SkipReason),
}

/// A continuation that has been started and awaits its requery.
///
/// Tickets are consumed exactly once, by `finish_continuation` or `abort_continuation`.
#[derive(Debug)]
pub struct ContinuationTicket<T: FeedItem> {
    direction: Direction,
    generation: u64,
    anchor: Anchor<T::Id, T::Key>,
    selection: Selection<T::Key>,
    previous_mode: Mode,
    previous_key: Option<ContinuationKey<T::Key>>,
    previous_selection: Selection<T::Key>,
}

impl<T: FeedItem> ContinuationTicket<T> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn anchor(&self) -> &Anchor<T::Id, T::Key> {
        &self.anchor
    }

    pub fn selection(&self) -> &Selection<T::Key> {
        &self.selection
    }
}

/// The outcome of [`FeedWindow::finish_continuation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Completion<K> {
    /// The anchor was reconciled. `delta` is `None` when the anchor row is no longer rendered.
    Reconciled {
        delta: Option<f64>,
        scroll: Option<ScrollCommand>,
    },
    /// A forward page came back short: the feed caught up with the tail and is now `Live`.
    ReachedTail(LiveRequest<K>),
    /// The mode moved on while the requery was in flight; nothing was applied.
    Stale,
}

/// What the host should do after a layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutAction<K> {
    None,
    EnterLive(LiveRequest<K>),
    Scroll(ScrollCommand),
}

/// The window/mode state machine for one viewport session.
///
/// This type is UI-agnostic:
/// - It holds no UI objects and performs no I/O.
/// - The host feeds it geometry (`bind`, `on_scroll`, `on_frame`, `observe_geometry`) and user
///   gestures (`note_user_gesture`), and executes the selections and scroll commands it returns.
/// - Continuations are split into `begin_continuation` / `finish_continuation` so the host can
///   await the requery without borrowing the engine across the suspension point.
///
/// For listener binding and an async driver over a live query, see the `feedwindow-adapter` crate.
pub struct FeedWindow<T: FeedItem> {
    options: FeedOptions,
    mode: Mode,
    /// Per-direction load guard, holding the generation of the in-flight continuation.
    loading: [Option<u64>; 2],
    last_continuation: Option<ContinuationKey<T::Key>>,
    generation: u64,
    issued: Selection<T::Key>,
    window: Window<T>,

    geometry: Option<Geometry>,
    metrics: Metrics,
    last_scroll_top: f64,
    user_scrolling: bool,
    scroll_paused: bool,
    recheck_pending: Option<Direction>,
    initialized: bool,

    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_subscription: u64,
    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl<T: FeedItem> Clone for FeedWindow<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            mode: self.mode,
            loading: self.loading,
            last_continuation: self.last_continuation,
            generation: self.generation,
            issued: self.issued,
            window: self.window.clone(),
            geometry: self.geometry,
            metrics: self.metrics,
            last_scroll_top: self.last_scroll_top,
            user_scrolling: self.user_scrolling,
            scroll_paused: self.scroll_paused,
            recheck_pending: self.recheck_pending,
            initialized: self.initialized,
            subscribers: self.subscribers.clone(),
            next_subscription: self.next_subscription,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }
}

impl<T: FeedItem> fmt::Debug for FeedWindow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedWindow")
            .field("options", &self.options)
            .field("mode", &self.mode)
            .field("loading", &self.loading)
            .field("last_continuation", &self.last_continuation)
            .field("generation", &self.generation)
            .field("issued", &self.issued)
            .field("len", &self.window.len())
            .field("geometry", &self.geometry)
            .field("metrics", &self.metrics)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<T: FeedItem> FeedWindow<T> {
    pub fn new(options: FeedOptions) -> Self {
        let issued = Selection::live(compute_limit(&options, None));
        fdebug!(limit = issued.limit, "FeedWindow::new");
        Self {
            options,
            mode: Mode::Live,
            loading: [None; 2],
            last_continuation: None,
            generation: 0,
            issued,
            window: Window::new(issued),
            geometry: None,
            metrics: Metrics::default(),
            last_scroll_top: 0.0,
            user_scrolling: false,
            scroll_paused: false,
            recheck_pending: None,
            initialized: false,
            subscribers: Vec::new(),
            next_subscription: 0,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: FeedOptions) {
        self.options = options;
        self.refresh_metrics();
        self.notify();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_loading(&self, direction: Direction) -> bool {
        self.loading[direction.slot()].is_some()
    }

    pub fn loading_backward(&self) -> bool {
        self.is_loading(Direction::Backward)
    }

    pub fn loading_forward(&self) -> bool {
        self.is_loading(Direction::Forward)
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_continuation(&self) -> Option<ContinuationKey<T::Key>> {
        self.last_continuation
    }

    /// The most recently issued selection (which may not have settled yet).
    pub fn issued_selection(&self) -> &Selection<T::Key> {
        &self.issued
    }

    pub fn window(&self) -> &Window<T> {
        &self.window
    }

    /// The materialized items in display order (ascending by key).
    pub fn items(&self) -> Vec<T> {
        self.window.display()
    }

    /// `true` while the feed follows the tail.
    pub fn should_auto_scroll(&self) -> bool {
        self.mode == Mode::Live
    }

    pub fn is_bound(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::resolve(&self.options, self.geometry.as_ref())
    }

    /// The limit a selection issued now would use.
    pub fn compute_limit(&self) -> usize {
        compute_limit(&self.options, self.geometry.as_ref())
    }

    /// Returns a snapshot of the observable state.
    pub fn state(&self) -> FeedState {
        FeedState {
            mode: self.mode,
            loading_backward: self.loading_backward(),
            loading_forward: self.loading_forward(),
            metrics: self.metrics,
            generation: self.generation,
            limit: self.issued.limit,
        }
    }

    /// Registers a callback fired whenever the observable state changes.
    pub fn subscribe(
        &mut self,
        f: impl Fn(&FeedWindow<T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);
        let f: Subscriber<T> = Arc::new(f);
        self.subscribers.push((id, f));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify_now(&self) {
        for (_, f) in &self.subscribers {
            f(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single subscriber notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    fn refresh_metrics(&mut self) {
        match &self.geometry {
            Some(g) => {
                let thresholds = Thresholds::resolve(&self.options, Some(g));
                self.metrics = Metrics::probe(g, thresholds, self.window.len());
            }
            None => self.metrics.result_count = self.window.len(),
        }
    }

    fn scroll_input(&self, scroll_delta: f64) -> ScrollInput {
        ScrollInput {
            metrics: self.metrics,
            scroll_delta,
            mode: self.mode,
            loading_backward: self.loading_backward(),
            loading_forward: self.loading_forward(),
        }
    }

    /// Binds a viewport. Geometry-dependent operations are no-ops until this is called.
    pub fn bind(&mut self, geometry: Geometry) {
        fdebug!(
            scroll_top = geometry.scroll_top,
            client_height = geometry.client_height,
            "bind"
        );
        self.geometry = Some(geometry);
        self.last_scroll_top = geometry.scroll_top;
        self.user_scrolling = false;
        self.scroll_paused = false;
        self.refresh_metrics();
        self.notify();
    }

    pub fn unbind(&mut self) {
        if self.geometry.is_none() {
            return;
        }
        fdebug!("unbind");
        self.geometry = None;
        self.user_scrolling = false;
        self.scroll_paused = false;
        self.recheck_pending = None;
        self.refresh_metrics();
        self.notify();
    }

    /// Records new geometry (resize, re-render) without evaluating thresholds.
    pub fn observe_geometry(&mut self, geometry: Geometry) {
        if self.geometry.is_none() {
            return;
        }
        self.geometry = Some(geometry);
        self.last_scroll_top = geometry.scroll_top;
        self.refresh_metrics();
        self.notify();
    }

    /// Marks the next scroll event as user-initiated (wheel, touch).
    pub fn note_user_gesture(&mut self) {
        if self.geometry.is_some() {
            self.user_scrolling = true;
        }
    }

    /// Handles a scroll event. Metrics are always refreshed; a continuation is only requested for
    /// user-initiated motion and never while a programmatic scroll is settling.
    ///
    /// A gesture is consumed only by a scroll event that arrives outside a programmatic-scroll
    /// pause.
    pub fn on_scroll(&mut self, geometry: Geometry) -> ScrollAction {
        if self.geometry.is_none() {
            return ScrollAction::None;
        }
        let scroll_delta = geometry.scroll_top - self.last_scroll_top;
        self.last_scroll_top = geometry.scroll_top;
        self.geometry = Some(geometry);
        self.refresh_metrics();
        self.notify();

        if !self.user_scrolling {
            return ScrollAction::None;
        }
        if self.scroll_paused {
            ftrace!(scroll_delta, "on_scroll: programmatic scroll pending");
            return ScrollAction::None;
        }
        self.user_scrolling = false;
        let action = decide_scroll(&self.scroll_input(scroll_delta));
        ftrace!(scroll_delta, action = ?action, "on_scroll");
        action
    }

    /// Handles a paint frame: ends a programmatic-scroll pause and, after a continuation settled,
    /// re-checks the buffers to chain the next continuation in the same direction.
    pub fn on_frame(&mut self, geometry: Geometry) -> ScrollAction {
        if self.geometry.is_none() {
            return ScrollAction::None;
        }
        self.geometry = Some(geometry);
        self.last_scroll_top = geometry.scroll_top;
        self.scroll_paused = false;
        self.refresh_metrics();
        self.notify();

        let Some(direction) = self.recheck_pending.take() else {
            return ScrollAction::None;
        };
        let action = decide_recheck(&self.scroll_input(0.0), direction);
        ftrace!(action = ?action, "on_frame: recheck");
        action
    }

    pub fn is_scroll_paused(&self) -> bool {
        self.scroll_paused
    }

    /// Requests a programmatic scroll. The resulting scroll event is not treated as user motion.
    ///
    /// Returns `None` when unbound or when the (clamped) target equals the current offset.
    pub fn scroll_to(&mut self, scroll_top: f64) -> Option<ScrollCommand> {
        let g = self.geometry.as_mut()?;
        let target = g.clamp_scroll_top(scroll_top);
        if target == g.scroll_top {
            return None;
        }
        g.scroll_top = target;
        self.last_scroll_top = target;
        self.scroll_paused = true;
        self.refresh_metrics();
        self.notify();
        Some(ScrollCommand { scroll_top: target })
    }

    pub fn scroll_to_bottom(&mut self) -> Option<ScrollCommand> {
        let height = self.geometry.as_ref()?.scroll_height;
        self.scroll_to(height)
    }

    /// Enters `Live`: clears both load guards and the continuation key, and issues the selection
    /// for the most recent `limit` items followed by a scroll to the bottom.
    pub fn set_live_mode(&mut self) -> LiveRequest<T::Key> {
        let limit = self.compute_limit();
        let selection = Selection::live(limit);
        self.generation = self.generation.wrapping_add(1);
        fdebug!(
            from = self.mode.as_str(),
            limit,
            generation = self.generation,
            "set_live_mode"
        );
        self.mode = Mode::Live;
        self.loading = [None; 2];
        self.last_continuation = None;
        self.issued = selection;
        self.recheck_pending = None;
        self.initialized = true;
        let scroll = self.scroll_to_bottom();
        self.notify();
        LiveRequest {
            selection,
            generation: self.generation,
            scroll,
        }
    }

    /// The explicit "jump to current" action.
    pub fn jump_to_live(&mut self) -> LiveRequest<T::Key> {
        self.set_live_mode()
    }

    /// The local user sent an item: follow the tail again.
    pub fn on_item_sent(&mut self) -> LiveRequest<T::Key> {
        self.set_live_mode()
    }

    /// Called after the host laid out rows. The first call enters `Live`; later calls keep the
    /// tail pinned while `Live`.
    pub fn after_layout(&mut self) -> LayoutAction<T::Key> {
        if !self.initialized {
            return LayoutAction::EnterLive(self.set_live_mode());
        }
        if self.mode == Mode::Live {
            if let Some(cmd) = self.scroll_to_bottom() {
                return LayoutAction::Scroll(cmd);
            }
        }
        LayoutAction::None
    }

    /// Mirrors the live query's materialized results after the issued selection settled.
    pub fn replace_results(&mut self, items: impl IntoIterator<Item = T>) {
        self.window.replace(self.issued, items);
        ftrace!(len = self.window.len(), limit = self.issued.limit, "replace_results");
        self.refresh_metrics();
        self.notify();
    }

    /// Applies a subscription changeset to the materialized window.
    pub fn apply_changeset(&mut self, changeset: Changeset<T>) -> bool {
        if changeset.is_empty() {
            return false;
        }
        let changed = self.window.apply_changeset(changeset);
        if changed {
            self.refresh_metrics();
            self.notify();
        }
        changed
    }

    /// Starts a continuation in `direction`.
    ///
    /// Proceeds only when no continuation is in flight, a container is bound, the window is not
    /// empty, an anchor row is rendered, and the `(direction, anchor key)` boundary differs from the
    /// last one issued. On proceeding, the direction's load guard is set, the mode switches, and
    /// the anchor's offset is captured.
    pub fn begin_continuation(
        &mut self,
        direction: Direction,
        layout: &impl RowLayout<T::Id>,
    ) -> ContinuationStart<T> {
        for d in [direction, direction.opposite()] {
            if self.is_loading(d) {
                ftrace!(direction = direction.as_str(), loading = d.as_str(), "skip: loading");
                return ContinuationStart::Skipped(SkipReason::AlreadyLoading(d));
            }
        }
        let Some(geometry) = self.geometry else {
            return ContinuationStart::Skipped(SkipReason::Unbound);
        };
        if self.window.is_empty() {
            fdebug!(direction = direction.as_str(), "empty window: entering live");
            return ContinuationStart::EnterLive(self.set_live_mode());
        }

        let thresholds = Thresholds::resolve(&self.options, Some(&geometry));
        let display = self.window.display();
        let Some(candidate) = select_anchor(
            direction,
            &display,
            layout,
            self.options.min_row_px,
            thresholds.step_back,
        ) else {
            return ContinuationStart::Skipped(SkipReason::NoAnchor);
        };

        let key = ContinuationKey {
            direction,
            anchor_key: candidate.item.key(),
        };
        if self.last_continuation == Some(key) {
            ftrace!(direction = direction.as_str(), "skip: duplicate boundary");
            return ContinuationStart::Skipped(SkipReason::Duplicate);
        }

        let limit = compute_limit(&self.options, Some(&geometry));
        let selection = Selection::continuation(direction, key.anchor_key, limit);
        self.generation = self.generation.wrapping_add(1);
        let ticket = ContinuationTicket {
            direction,
            generation: self.generation,
            anchor: Anchor::from_candidate(&candidate),
            selection,
            previous_mode: self.mode,
            previous_key: self.last_continuation,
            previous_selection: self.issued,
        };
        fdebug!(
            direction = direction.as_str(),
            anchor_key = ?key.anchor_key,
            limit,
            generation = self.generation,
            "begin_continuation"
        );

        self.loading[direction.slot()] = Some(self.generation);
        self.mode = direction.mode();
        self.last_continuation = Some(key);
        self.issued = selection;
        self.recheck_pending = None;
        self.notify();
        ContinuationStart::Proceed(ticket)
    }

    /// Completes a continuation after its results were mirrored with [`Self::replace_results`]
    /// and re-rendered.
    ///
    /// Call [`Self::observe_geometry`] with the post-render geometry first so the adjusted offset
    /// is clamped against the new content height.
    pub fn finish_continuation(
        &mut self,
        ticket: ContinuationTicket<T>,
        layout: &impl RowLayout<T::Id>,
    ) -> Completion<T::Key> {
        let slot = ticket.direction.slot();
        if ticket.generation != self.generation {
            if self.loading[slot] == Some(ticket.generation) {
                self.loading[slot] = None;
                self.notify();
            }
            fdebug!(
                direction = ticket.direction.as_str(),
                ticket = ticket.generation,
                current = self.generation,
                "finish_continuation: stale"
            );
            return Completion::Stale;
        }

        if ticket.direction == Direction::Forward && self.window.len() < ticket.selection.limit {
            fdebug!(
                len = self.window.len(),
                limit = ticket.selection.limit,
                "finish_continuation: reached tail"
            );
            return Completion::ReachedTail(self.set_live_mode());
        }

        let delta = ticket.anchor.delta(layout);
        let scroll = match (delta, self.geometry) {
            (Some(d), Some(g)) if d != 0.0 => self.scroll_to(g.scroll_top + d),
            _ => None,
        };
        if delta.is_none() {
            fwarn!(anchor = ?ticket.anchor.id, "finish_continuation: anchor no longer rendered");
        }
        ftrace!(
            direction = ticket.direction.as_str(),
            delta = ?delta,
            "finish_continuation"
        );
        self.loading[slot] = None;
        self.recheck_pending = Some(ticket.direction);
        self.notify();
        Completion::Reconciled { delta, scroll }
    }

    /// Rolls back a continuation whose requery failed: the guard is cleared and, if nothing else
    /// happened meanwhile, the previous mode, continuation key and selection are restored.
    pub fn abort_continuation(&mut self, ticket: ContinuationTicket<T>) {
        let slot = ticket.direction.slot();
        if self.loading[slot] == Some(ticket.generation) {
            self.loading[slot] = None;
        }
        if ticket.generation == self.generation {
            fwarn!(
                direction = ticket.direction.as_str(),
                restored = ticket.previous_mode.as_str(),
                "abort_continuation"
            );
            self.mode = ticket.previous_mode;
            self.last_continuation = ticket.previous_key;
            self.issued = ticket.previous_selection;
        }
        self.notify();
    }
}
