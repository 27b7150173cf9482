use feedwindow::{
    Changeset, Completion, ContinuationStart, Direction, FeedItem, FeedOptions, FeedState,
    FeedWindow, LayoutAction, LiveRequest, Mode, ScrollAction, ScrollCommand, SkipReason,
    Unmounted,
};

use crate::{BindOutcome, Error, EventBinder, LiveQuery, ScrollContainer, ViewportEvent};

/// What [`Controller::load_more`] ended up doing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadOutcome {
    Skipped(SkipReason),
    /// The window was empty, so the live selection was issued instead.
    EnteredLive,
    /// The page was applied. `delta` is the anchor's offset shift, if it stayed rendered.
    Reconciled { delta: Option<f64> },
    /// A short forward page: the feed is back to following the tail.
    ReachedTail,
    /// The mode changed while the requery was in flight.
    Stale,
}

/// A framework-neutral driver that wires a [`FeedWindow`] to a live query and a scroll container.
///
/// The controller owns all three and runs the continuation sequence end to end:
/// anchor capture, requery, re-render, and scroll reconciliation. Adapters forward container
/// events through [`Self::handle_event`] / [`Self::on_frame`] and execute the returned
/// [`ScrollAction`]s with [`Self::load_more`] (or let [`Self::settle`] chain them).
///
/// Operations take `&mut self`, so at most one requery is in flight per controller.
pub struct Controller<T, Q, C>
where
    T: FeedItem,
    Q: LiveQuery<T>,
    C: ScrollContainer<T>,
{
    feed: FeedWindow<T>,
    query: Q,
    binder: EventBinder<C>,
}

impl<T, Q, C> Controller<T, Q, C>
where
    T: FeedItem,
    Q: LiveQuery<T>,
    C: ScrollContainer<T>,
{
    pub fn new(options: FeedOptions, query: Q) -> Self {
        Self {
            feed: FeedWindow::new(options),
            query,
            binder: EventBinder::new(),
        }
    }

    pub fn feed(&self) -> &FeedWindow<T> {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut FeedWindow<T> {
        &mut self.feed
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    pub fn container(&self) -> Option<&C> {
        self.binder.container()
    }

    pub fn container_mut(&mut self) -> Option<&mut C> {
        self.binder.container_mut()
    }

    pub fn binder(&self) -> &EventBinder<C> {
        &self.binder
    }

    pub fn mode(&self) -> Mode {
        self.feed.mode()
    }

    pub fn state(&self) -> FeedState {
        self.feed.state()
    }

    /// The materialized items in display order.
    pub fn items(&self) -> Vec<T> {
        self.feed.items()
    }

    pub fn should_auto_scroll(&self) -> bool {
        self.feed.should_auto_scroll()
    }

    /// Binds a container (or unbinds, for `None`). Rebinding the same container is a no-op.
    pub fn bind_container(&mut self, container: Option<C>) -> BindOutcome<C> {
        let outcome = self.binder.bind(container);
        match &outcome {
            BindOutcome::Attached | BindOutcome::Replaced(_) => {
                if let Some(c) = self.binder.container_mut() {
                    c.render(&self.feed.items());
                    self.feed.bind(c.geometry());
                }
            }
            BindOutcome::Released(_) => self.feed.unbind(),
            BindOutcome::Unchanged | BindOutcome::Idle => {}
        }
        outcome
    }

    /// Releases the container and its listeners. Later events are ignored until a new bind.
    pub fn destroy(&mut self) -> Option<C> {
        let released = self.binder.release();
        self.feed.unbind();
        released
    }

    /// Forwards a container event. Gestures only mark the next scroll as user-initiated.
    pub fn handle_event(&mut self, event: ViewportEvent) -> ScrollAction {
        let Some(c) = self.binder.container() else {
            return ScrollAction::None;
        };
        if event.is_gesture() {
            self.feed.note_user_gesture();
            return ScrollAction::None;
        }
        let geometry = c.geometry();
        self.feed.on_scroll(geometry)
    }

    /// Forwards a paint frame. Returns a chained continuation to run, if any.
    pub fn on_frame(&mut self) -> ScrollAction {
        let Some(c) = self.binder.container() else {
            return ScrollAction::None;
        };
        let geometry = c.geometry();
        self.feed.on_frame(geometry)
    }

    /// Runs one continuation in `direction` to completion.
    ///
    /// On a requery failure the continuation is rolled back and the error returned.
    pub async fn load_more(&mut self, direction: Direction) -> Result<LoadOutcome, Error<Q::Error>> {
        let start = match self.binder.container() {
            Some(c) => self.feed.begin_continuation(direction, c),
            None => return Ok(LoadOutcome::Skipped(SkipReason::Unbound)),
        };
        let ticket = match start {
            ContinuationStart::Proceed(ticket) => ticket,
            ContinuationStart::EnterLive(request) => {
                self.run_live(request).await?;
                return Ok(LoadOutcome::EnteredLive);
            }
            ContinuationStart::Skipped(reason) => return Ok(LoadOutcome::Skipped(reason)),
        };

        let result = self.query.update_selection(ticket.selection()).await;
        if let Err(source) = result {
            let mode = ticket.direction().mode();
            fwarn!(mode = mode.as_str(), "continuation requery failed");
            self.feed.abort_continuation(ticket);
            return Err(Error::Requery { mode, source });
        }

        self.feed.replace_results(self.query.items());
        self.render();
        let completion = match self.binder.container() {
            Some(c) => self.feed.finish_continuation(ticket, c),
            None => self.feed.finish_continuation(ticket, &Unmounted),
        };

        match completion {
            Completion::Reconciled { delta, scroll } => {
                self.apply_scroll(scroll);
                Ok(LoadOutcome::Reconciled { delta })
            }
            Completion::ReachedTail(request) => {
                self.run_live(request).await?;
                Ok(LoadOutcome::ReachedTail)
            }
            Completion::Stale => Ok(LoadOutcome::Stale),
        }
    }

    /// Runs `action` and then every continuation chained by the following frames, up to
    /// `max_loads` continuations. Returns how many were run.
    pub async fn settle(
        &mut self,
        action: ScrollAction,
        max_loads: usize,
    ) -> Result<usize, Error<Q::Error>> {
        let mut next = action;
        let mut loads = 0;
        while let ScrollAction::Continue(direction) = next {
            if loads == max_loads {
                fdebug!(loads, "settle: chain limit reached");
                break;
            }
            match self.load_more(direction).await? {
                LoadOutcome::Reconciled { .. } => loads += 1,
                LoadOutcome::ReachedTail | LoadOutcome::EnteredLive => {
                    loads += 1;
                    break;
                }
                LoadOutcome::Skipped(_) | LoadOutcome::Stale => break,
            }
            next = self.on_frame();
        }
        Ok(loads)
    }

    /// Called after the host laid out rows: enters `Live` the first time, then keeps the tail
    /// pinned while `Live`.
    pub async fn after_layout(&mut self) -> Result<(), Error<Q::Error>> {
        if let Some(c) = self.binder.container() {
            let geometry = c.geometry();
            self.feed.observe_geometry(geometry);
        }
        match self.feed.after_layout() {
            LayoutAction::EnterLive(request) => self.run_live(request).await,
            LayoutAction::Scroll(cmd) => {
                self.apply_scroll(Some(cmd));
                Ok(())
            }
            LayoutAction::None => Ok(()),
        }
    }

    pub async fn set_live_mode(&mut self) -> Result<(), Error<Q::Error>> {
        let request = self.feed.set_live_mode();
        self.run_live(request).await
    }

    pub async fn jump_to_live(&mut self) -> Result<(), Error<Q::Error>> {
        let request = self.feed.jump_to_live();
        self.run_live(request).await
    }

    pub async fn on_item_sent(&mut self) -> Result<(), Error<Q::Error>> {
        let request = self.feed.on_item_sent();
        self.run_live(request).await
    }

    /// Applies a subscription changeset and re-renders. While `Live`, the tail stays pinned.
    pub fn on_changeset(&mut self, changeset: Changeset<T>) -> bool {
        if !self.feed.apply_changeset(changeset) {
            return false;
        }
        self.render();
        if self.feed.should_auto_scroll() {
            let cmd = self.feed.scroll_to_bottom();
            self.apply_scroll(cmd);
        }
        true
    }

    async fn run_live(&mut self, request: LiveRequest<T::Key>) -> Result<(), Error<Q::Error>> {
        self.apply_scroll(request.scroll);
        if let Err(source) = self.query.update_selection(&request.selection).await {
            fwarn!(generation = request.generation, "live requery failed");
            return Err(Error::Requery {
                mode: Mode::Live,
                source,
            });
        }
        self.feed.replace_results(self.query.items());
        self.render();
        let cmd = self.feed.scroll_to_bottom();
        self.apply_scroll(cmd);
        Ok(())
    }

    fn render(&mut self) {
        let items = self.feed.items();
        if let Some(c) = self.binder.container_mut() {
            c.render(&items);
            let geometry = c.geometry();
            self.feed.observe_geometry(geometry);
        }
    }

    fn apply_scroll(&mut self, cmd: Option<ScrollCommand>) {
        let Some(cmd) = cmd else {
            return;
        };
        if let Some(c) = self.binder.container_mut() {
            ftrace!(scroll_top = cmd.scroll_top, "apply_scroll");
            c.set_scroll_top(cmd.scroll_top);
        }
    }
}
