use crate::*;

use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct Msg {
    id: u64,
    ts: i64,
}

impl FeedItem for Msg {
    type Key = i64;
    type Id = u64;

    fn key(&self) -> i64 {
        self.ts
    }

    fn id(&self) -> u64 {
        self.id
    }
}

fn msg(ts: i64) -> Msg {
    Msg {
        id: 1000 + ts as u64,
        ts,
    }
}

fn store(range: core::ops::RangeInclusive<i64>) -> Vec<Msg> {
    range.map(msg).collect()
}

/// What a live query over `store` would materialize for `selection`.
fn run_query(store: &[Msg], selection: &Selection<i64>) -> Vec<Msg> {
    let mut out: Vec<Msg> = store
        .iter()
        .filter(|m| selection.admits(&m.ts))
        .cloned()
        .collect();
    match selection.order {
        Order::Asc => out.sort_by_key(|m| m.ts),
        Order::Desc => out.sort_by(|a, b| b.ts.cmp(&a.ts)),
    }
    out.truncate(selection.limit);
    out
}

/// Rows stacked top to bottom in display order, each `height` tall.
#[derive(Default)]
struct Rows(HashMap<u64, (f64, f64)>);

impl Rows {
    fn stack(display: &[Msg], height: f64) -> Self {
        let mut rows = HashMap::new();
        for (i, m) in display.iter().enumerate() {
            rows.insert(m.id, (i as f64 * height, height));
        }
        Self(rows)
    }

    fn content_height(&self) -> f64 {
        self.0.values().map(|(top, h)| top + h).fold(0.0, f64::max)
    }
}

impl RowLayout<u64> for Rows {
    fn row_height(&self, id: &u64) -> Option<f64> {
        self.0.get(id).map(|(_, h)| *h)
    }

    fn row_offset(&self, id: &u64) -> Option<f64> {
        self.0.get(id).map(|(top, _)| *top)
    }
}

const CLIENT: f64 = 200.0;
const ROW: f64 = 50.0;

// limit = ceil(200 * 3 / 60) = 10, min_buffer = 200, step_back = 300
fn options() -> FeedOptions {
    FeedOptions::default()
        .with_min_row_px(60.0)
        .with_step_back_screens(1.5)
}

fn geo(scroll_top: f64, scroll_height: f64) -> Geometry {
    Geometry::new(scroll_top, scroll_height, CLIENT)
}

/// A bound feed in `Live`, showing `[100..91]` scrolled to the bottom.
fn live_feed() -> (FeedWindow<Msg>, Rows) {
    let mut f = FeedWindow::<Msg>::new(options());
    f.bind(geo(0.0, 0.0));
    let live = f.set_live_mode();
    assert_eq!(live.selection, Selection::live(10));
    f.replace_results(run_query(&store(1..=100), &live.selection));
    let rows = Rows::stack(&f.items(), ROW);
    f.observe_geometry(geo(300.0, rows.content_height()));
    (f, rows)
}

fn proceed(start: ContinuationStart<Msg>) -> ContinuationTicket<Msg> {
    match start {
        ContinuationStart::Proceed(ticket) => ticket,
        other => panic!("expected Proceed, got {other:?}"),
    }
}

#[test]
fn limit_covers_query_size_screens() {
    let o = FeedOptions::default();
    assert_eq!(compute_limit(&o, None), 100);

    // 260 * 3 / 78 = 10 exactly.
    assert_eq!(compute_limit(&o, Some(&Geometry::new(0.0, 0.0, 260.0))), 10);
    // 261 * 3 / 78 = 10.04 -> 11
    assert_eq!(compute_limit(&o, Some(&Geometry::new(0.0, 0.0, 261.0))), 11);

    let padded = Geometry::new(0.0, 0.0, 286.0).with_padding(13.0, 13.0);
    assert_eq!(compute_limit(&o, Some(&padded)), 10);

    assert_eq!(compute_limit(&o, Some(&Geometry::new(0.0, 0.0, 0.0))), 1);
}

#[test]
fn limit_saturates_for_degenerate_row_heights() {
    let tiny = FeedOptions::default().with_min_row_px(1e-300);
    assert_eq!(
        compute_limit(&tiny, Some(&Geometry::new(0.0, 0.0, 200.0))),
        usize::MAX
    );

    let o = FeedOptions::default();
    let endless = Geometry::new(0.0, 0.0, f64::INFINITY);
    assert_eq!(compute_limit(&o, Some(&endless)), usize::MAX);

    let mut f = FeedWindow::<Msg>::new(tiny);
    f.bind(geo(0.0, 0.0));
    assert_eq!(f.set_live_mode().selection.limit, usize::MAX);
}

#[test]
fn thresholds_scale_with_viewport_and_fall_back_when_unbound() {
    let o = FeedOptions::default().with_min_buffer_screens(0.5);
    let t = Thresholds::resolve(&o, Some(&Geometry::new(0.0, 1000.0, 400.0)));
    assert_eq!(t.min_buffer, 200.0);
    assert_eq!(t.step_back, 400.0);

    let t = Thresholds::resolve(&o, None);
    assert_eq!(t.min_buffer, 150.0);
    assert_eq!(t.step_back, 240.0);

    let o = o.with_fallback_thresholds(90.0, 120.0);
    assert_eq!(
        Thresholds::resolve(&o, None),
        Thresholds {
            min_buffer: 90.0,
            step_back: 120.0,
        }
    );
}

#[test]
fn metrics_probe_reports_gaps() {
    let g = Geometry::new(120.0, 1000.0, 300.0);
    let m = Metrics::probe(
        &g,
        Thresholds {
            min_buffer: 300.0,
            step_back: 300.0,
        },
        7,
    );
    assert_eq!(m.top_gap, 120.0);
    assert_eq!(m.bottom_gap, 580.0);
    assert_eq!(m.result_count, 7);
    assert!(m.top_within_buffer());
    assert!(!m.bottom_within_buffer());
}

#[test]
fn anchor_walks_back_from_trailing_edge() {
    let display = store(91..=100);
    let rows = Rows::stack(&display, ROW);

    let a = select_anchor(Direction::Backward, &display, &rows, 60.0, 300.0).unwrap();
    assert_eq!(a.item.ts, 95);
    assert_eq!(a.display_index, 4);
    assert_eq!(a.offset, 200.0);
    assert_eq!(a.accumulated, 300.0);

    let a = select_anchor(Direction::Forward, &display, &rows, 60.0, 300.0).unwrap();
    assert_eq!(a.item.ts, 96);
    assert_eq!(a.display_index, 5);
}

#[test]
fn anchor_uses_estimate_for_unmeasured_rows() {
    let display = store(1..=5);
    let rows = Rows::stack(&display, 100.0);
    // Row 5 is positioned but has no measured height.
    struct NoHeight<'a>(&'a Rows, u64);
    impl RowLayout<u64> for NoHeight<'_> {
        fn row_height(&self, id: &u64) -> Option<f64> {
            if *id == self.1 {
                None
            } else {
                self.0.row_height(id)
            }
        }
        fn row_offset(&self, id: &u64) -> Option<f64> {
            self.0.row_offset(id)
        }
    }
    let layout = NoHeight(&rows, msg(5).id);

    // 10 (estimate) + 100 + 100 >= 200
    let a = select_anchor(Direction::Backward, &display, &layout, 10.0, 200.0).unwrap();
    assert_eq!(a.item.ts, 3);
    assert_eq!(a.accumulated, 210.0);
}

#[test]
fn anchor_falls_back_to_far_edge_and_handles_single_row() {
    let display = store(1..=3);
    let rows = Rows::stack(&display, ROW);
    let a = select_anchor(Direction::Backward, &display, &rows, 60.0, 10_000.0).unwrap();
    assert_eq!(a.item.ts, 1);

    let single = store(7..=7);
    let rows = Rows::stack(&single, ROW);
    let a = select_anchor(Direction::Forward, &single, &rows, 60.0, 10_000.0).unwrap();
    assert_eq!(a.item.ts, 7);

    let empty: [Msg; 0] = [];
    assert!(select_anchor(Direction::Backward, &empty, &rows, 60.0, 1.0).is_none());
    assert!(select_anchor(Direction::Backward, &display, &Unmounted, 60.0, 1.0).is_none());
}

#[test]
fn anchor_reconciles_by_identity_after_prepend() {
    let before = store(11..=20);
    let rows = Rows::stack(&before, ROW);
    let anchor = Anchor::capture(msg(12).id, 12, &rows).unwrap();
    assert_eq!(anchor.offset_before, 50.0);

    // Ten older rows land above it.
    let rows = Rows::stack(&store(1..=20), ROW);
    assert_eq!(anchor.delta(&rows), Some(500.0));
    assert_eq!(anchor.reconcile(30.0, &rows), Some(530.0));

    let rows = Rows::stack(&store(13..=20), ROW);
    assert_eq!(anchor.reconcile(30.0, &rows), None);
    assert!(Anchor::capture(msg(1).id, 1, &rows).is_none());
}

#[test]
fn window_normalizes_replaced_results() {
    let mut w = Window::<Msg>::new(Selection::live(3));
    w.replace(
        Selection::live(3),
        [msg(2), msg(9), msg(5), msg(9), msg(7)],
    );
    let keys: Vec<i64> = w.storage().iter().map(|m| m.ts).collect();
    assert_eq!(keys, [9, 7, 5]);
    let display: Vec<i64> = w.display().iter().map(|m| m.ts).collect();
    assert_eq!(display, [5, 7, 9]);
    assert!(w.is_well_formed());

    w.replace(
        Selection::continuation(Direction::Forward, 5, 10),
        store(1..=8),
    );
    let display: Vec<i64> = w.display().iter().map(|m| m.ts).collect();
    assert_eq!(display, [5, 6, 7, 8]);
    assert!(w.is_well_formed());
}

#[test]
fn live_window_applies_changesets_at_the_tail() {
    let mut w = Window::<Msg>::new(Selection::live(3));
    w.replace(Selection::live(3), store(1..=3));

    let changed = w.apply_changeset(Changeset {
        adds: vec![msg(4)],
        removes: vec![],
    });
    assert!(changed);
    let keys: Vec<i64> = w.storage().iter().map(|m| m.ts).collect();
    assert_eq!(keys, [4, 3, 2]);

    let changed = w.apply_changeset(Changeset {
        adds: vec![],
        removes: vec![msg(3).id, 12345],
    });
    assert!(changed);
    let keys: Vec<i64> = w.storage().iter().map(|m| m.ts).collect();
    assert_eq!(keys, [4, 2]);
    assert!(w.is_well_formed());

    // Re-adding an existing identity with a new key moves it.
    let moved = Msg {
        id: msg(2).id,
        ts: 10,
    };
    w.apply_changeset(Changeset {
        adds: vec![moved],
        removes: vec![],
    });
    let keys: Vec<i64> = w.storage().iter().map(|m| m.ts).collect();
    assert_eq!(keys, [10, 4]);
    assert!(w.is_well_formed());
}

#[test]
fn paged_window_ignores_adds_outside_its_bound() {
    let mut w = Window::<Msg>::new(Selection::live(1));
    w.replace(
        Selection::continuation(Direction::Backward, 50, 3),
        store(40..=60),
    );
    let changed = w.apply_changeset(Changeset {
        adds: vec![msg(70), msg(1)],
        removes: vec![],
    });
    assert!(!changed);
    let keys: Vec<i64> = w.storage().iter().map(|m| m.ts).collect();
    assert_eq!(keys, [50, 49, 48]);
}

#[test]
fn decide_scroll_respects_direction_guards_and_live_tail() {
    let metrics = Metrics {
        top_gap: 10.0,
        bottom_gap: 10.0,
        min_buffer: 100.0,
        step_back: 100.0,
        result_count: 10,
    };
    let mut input = ScrollInput {
        metrics,
        scroll_delta: -5.0,
        mode: Mode::Live,
        loading_backward: false,
        loading_forward: false,
    };
    assert_eq!(
        decide_scroll(&input),
        ScrollAction::Continue(Direction::Backward)
    );

    input.loading_backward = true;
    assert_eq!(decide_scroll(&input), ScrollAction::None);

    input.scroll_delta = 5.0;
    assert_eq!(decide_scroll(&input), ScrollAction::None, "live tracks the tail");

    input.mode = Mode::Backward;
    assert_eq!(
        decide_scroll(&input),
        ScrollAction::Continue(Direction::Forward)
    );

    input.scroll_delta = 0.0;
    assert_eq!(decide_scroll(&input), ScrollAction::None);

    input.metrics.bottom_gap = 500.0;
    input.loading_backward = false;
    assert_eq!(
        decide_recheck(&input, Direction::Backward),
        ScrollAction::Continue(Direction::Backward)
    );
    assert_eq!(decide_recheck(&input, Direction::Forward), ScrollAction::None);

    input.metrics.top_gap = 500.0;
    input.metrics.bottom_gap = 5.0;
    assert_eq!(
        decide_recheck(&input, Direction::Forward),
        ScrollAction::Continue(Direction::Forward)
    );
    assert_eq!(
        decide_recheck(&input, Direction::Backward),
        ScrollAction::None,
        "a settled backward page never chains forward"
    );
    input.mode = Mode::Live;
    assert_eq!(decide_recheck(&input, Direction::Forward), ScrollAction::None);
}

#[test]
fn backward_continuation_keeps_anchor_fixed() {
    let (mut f, rows) = live_feed();
    assert_eq!(f.mode(), Mode::Live);
    assert_eq!(f.window().storage().first().map(|m| m.ts), Some(100));
    assert_eq!(f.window().len(), 10);

    // User scrolls up into the top buffer.
    f.note_user_gesture();
    let action = f.on_scroll(geo(50.0, 500.0));
    assert_eq!(action, ScrollAction::Continue(Direction::Backward));
    assert_eq!(f.metrics().top_gap, 50.0);

    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    assert_eq!(ticket.anchor().key, 95);
    assert_eq!(
        *ticket.selection(),
        Selection::continuation(Direction::Backward, 95, 10)
    );
    assert_eq!(
        QueryTemplate::new("room = ?", "timestamp").render(ticket.selection()),
        "room = ? AND timestamp <= ? ORDER BY timestamp DESC LIMIT 10"
    );
    assert_eq!(f.mode(), Mode::Backward);
    assert!(f.loading_backward());
    let on_screen_before = ticket.anchor().offset_before - 50.0;

    f.replace_results(run_query(&store(1..=100), ticket.selection()));
    let keys: Vec<i64> = f.window().storage().iter().map(|m| m.ts).collect();
    assert_eq!(keys, (86..=95).rev().collect::<Vec<_>>());

    let rows = Rows::stack(&f.items(), ROW);
    f.observe_geometry(geo(50.0, rows.content_height()));
    let completion = f.finish_continuation(ticket, &rows);
    assert_eq!(
        completion,
        Completion::Reconciled {
            delta: Some(250.0),
            scroll: Some(ScrollCommand { scroll_top: 300.0 }),
        }
    );
    assert!(!f.loading_backward());
    assert_eq!(f.mode(), Mode::Backward);

    let on_screen_after = rows.row_offset(&msg(95).id).unwrap() - 300.0;
    assert!((on_screen_after - on_screen_before).abs() < 1.0);

    // The page lands at the bottom edge; the next frame must not chain forward and undo it.
    let g = f.geometry().unwrap();
    assert_eq!(g.bottom_gap(), 0.0);
    assert_eq!(f.on_frame(g), ScrollAction::None);
}

#[test]
fn short_forward_page_returns_to_live() {
    let (mut f, rows) = live_feed();
    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    f.replace_results(run_query(&store(1..=97), ticket.selection()));
    let rows = Rows::stack(&f.items(), ROW);
    f.observe_geometry(geo(50.0, rows.content_height()));
    f.finish_continuation(ticket, &rows);

    // Anchor walks 300px down from the top of [86..95]: 91.
    let ticket = proceed(f.begin_continuation(Direction::Forward, &rows));
    assert_eq!(ticket.anchor().key, 91);
    assert_eq!(f.mode(), Mode::Forward);
    assert!(f.loading_forward());

    // Only 91..=97 exist: 7 < 10.
    f.replace_results(run_query(&store(1..=97), ticket.selection()));
    assert_eq!(f.window().len(), 7);
    let rows = Rows::stack(&f.items(), ROW);
    f.observe_geometry(geo(0.0, rows.content_height()));
    let completion = f.finish_continuation(ticket, &rows);

    let Completion::ReachedTail(live) = completion else {
        panic!("expected ReachedTail, got {completion:?}");
    };
    assert_eq!(live.selection, Selection::live(10));
    assert_eq!(live.scroll, Some(ScrollCommand { scroll_top: 150.0 }));
    assert_eq!(f.mode(), Mode::Live);
    assert!(!f.loading_forward());
    assert!(!f.loading_backward());
    assert_eq!(f.last_continuation(), None);
}

#[test]
fn forward_continuations_converge_on_the_tail() {
    let all = store(1..=200);
    let mut f = FeedWindow::<Msg>::new(options());
    f.bind(geo(0.0, 0.0));
    f.set_live_mode();
    f.replace_results(run_query(&all, f.issued_selection()));

    // Page far back, then forward until the tail is reached.
    let mut steps = 0;
    let mut direction = Direction::Backward;
    for _ in 0..40 {
        let rows_now = Rows::stack(&f.items(), ROW);
        let ticket = proceed(f.begin_continuation(direction, &rows_now));
        f.replace_results(run_query(&all, ticket.selection()));
        let after = Rows::stack(&f.items(), ROW);
        f.observe_geometry(geo(0.0, after.content_height()));
        if direction == Direction::Backward && f.window().storage()[0].ts < 120 {
            direction = Direction::Forward;
        }
        match f.finish_continuation(ticket, &after) {
            Completion::ReachedTail(_) => break,
            Completion::Reconciled { .. } => steps += 1,
            Completion::Stale => panic!("no concurrent transitions happen here"),
        }
        assert!(f.window().is_well_formed());
        assert!(f.window().len() <= f.window().limit());
    }
    assert!(steps > 5);
    assert_eq!(f.mode(), Mode::Live);
}

#[test]
fn guards_reject_overlapping_continuations() {
    let (mut f, rows) = live_feed();
    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    assert!(matches!(
        f.begin_continuation(Direction::Backward, &rows),
        ContinuationStart::Skipped(SkipReason::AlreadyLoading(Direction::Backward))
    ));
    assert!(matches!(
        f.begin_continuation(Direction::Forward, &rows),
        ContinuationStart::Skipped(SkipReason::AlreadyLoading(Direction::Backward))
    ));

    // A user scroll while loading backward does not request another one.
    f.note_user_gesture();
    assert_eq!(f.on_scroll(geo(10.0, 500.0)), ScrollAction::None);

    f.finish_continuation(ticket, &rows);
    assert!(!f.loading_backward());
}

#[test]
fn duplicate_boundary_is_skipped() {
    let (mut f, rows) = live_feed();
    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    // The window was not replaced, so the same anchor comes up again.
    f.finish_continuation(ticket, &rows);
    assert!(matches!(
        f.begin_continuation(Direction::Backward, &rows),
        ContinuationStart::Skipped(SkipReason::Duplicate)
    ));
    assert!(!f.loading_backward());
}

#[test]
fn missing_prerequisites_leave_guards_untouched() {
    let mut f = FeedWindow::<Msg>::new(options());
    let rows = Rows::default();
    assert!(matches!(
        f.begin_continuation(Direction::Backward, &rows),
        ContinuationStart::Skipped(SkipReason::Unbound)
    ));
    f.note_user_gesture();
    assert_eq!(f.on_scroll(geo(0.0, 100.0)), ScrollAction::None);
    assert_eq!(f.scroll_to(10.0), None);

    // Bound but empty: fall back to live.
    f.bind(geo(0.0, 0.0));
    let generation = f.generation();
    match f.begin_continuation(Direction::Backward, &rows) {
        ContinuationStart::EnterLive(live) => {
            assert_eq!(live.selection, Selection::live(10));
            assert_eq!(live.generation, generation + 1);
        }
        other => panic!("expected EnterLive, got {other:?}"),
    }

    // Bound with items but nothing rendered: abandoned silently.
    f.replace_results(store(1..=10));
    assert!(matches!(
        f.begin_continuation(Direction::Backward, &Unmounted),
        ContinuationStart::Skipped(SkipReason::NoAnchor)
    ));
    assert!(!f.loading_backward());
    assert_eq!(f.mode(), Mode::Live);
}

#[test]
fn late_completion_after_live_reset_is_discarded() {
    let (mut f, rows) = live_feed();
    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    f.jump_to_live();
    assert_eq!(f.mode(), Mode::Live);

    f.replace_results(run_query(&store(1..=100), ticket.selection()));
    let completion = f.finish_continuation(ticket, &rows);
    assert_eq!(completion, Completion::Stale);
    assert_eq!(f.mode(), Mode::Live);
    assert!(!f.loading_backward());
}

#[test]
fn stale_completion_keeps_a_newer_guard() {
    let (mut f, rows) = live_feed();
    let old = proceed(f.begin_continuation(Direction::Backward, &rows));
    f.set_live_mode();
    let newer = proceed(f.begin_continuation(Direction::Backward, &rows));

    assert_eq!(f.finish_continuation(old, &rows), Completion::Stale);
    assert!(f.loading_backward(), "the newer continuation is still in flight");

    f.abort_continuation(newer);
    assert!(!f.loading_backward());
}

#[test]
fn aborted_continuation_restores_previous_mode() {
    let (mut f, rows) = live_feed();
    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    assert_eq!(f.mode(), Mode::Backward);

    f.abort_continuation(ticket);
    assert_eq!(f.mode(), Mode::Live);
    assert!(!f.loading_backward());
    assert_eq!(f.last_continuation(), None);
    assert_eq!(*f.issued_selection(), Selection::live(10));

    // The same boundary can be retried.
    assert!(matches!(
        f.begin_continuation(Direction::Backward, &rows),
        ContinuationStart::Proceed(_)
    ));
}

#[test]
fn set_live_mode_is_idempotent() {
    let (mut f, rows) = live_feed();
    let _ticket = proceed(f.begin_continuation(Direction::Backward, &rows));

    let first = f.set_live_mode();
    let state_once = (f.mode(), f.loading_backward(), f.loading_forward());
    let second = f.set_live_mode();
    let state_twice = (f.mode(), f.loading_backward(), f.loading_forward());

    assert_eq!(first.selection, second.selection);
    assert_eq!(state_once, state_twice);
    assert_eq!(state_twice, (Mode::Live, false, false));
    assert_eq!(f.last_continuation(), None);
}

#[test]
fn programmatic_scroll_is_not_user_motion() {
    let (mut f, _rows) = live_feed();
    let cmd = f.scroll_to(150.0).unwrap();
    assert_eq!(cmd.scroll_top, 150.0);
    assert!(f.is_scroll_paused());

    // The echo of a programmatic scroll does not trigger, even with a gesture pending.
    f.note_user_gesture();
    assert_eq!(f.on_scroll(geo(150.0, 500.0)), ScrollAction::None);

    // The gesture survives the pause and applies to the next real scroll.
    f.on_frame(geo(150.0, 500.0));
    assert!(!f.is_scroll_paused());
    assert_eq!(
        f.on_scroll(geo(100.0, 500.0)),
        ScrollAction::Continue(Direction::Backward)
    );

    // Scroll events without a preceding gesture never trigger.
    assert_eq!(f.on_scroll(geo(50.0, 500.0)), ScrollAction::None);

    // Same target: nothing to do.
    assert_eq!(f.scroll_to(50.0), None);
}

#[test]
fn frame_after_completion_chains_the_next_continuation() {
    let (mut f, rows) = live_feed();
    let ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    f.replace_results(run_query(&store(1..=100), ticket.selection()));
    let rows = Rows::stack(&f.items(), ROW);
    f.observe_geometry(geo(0.0, rows.content_height()));

    // The viewport is still inside the top buffer on the next frame.
    let completion = f.finish_continuation(ticket, &rows);
    assert!(matches!(completion, Completion::Reconciled { .. }));
    let g = f.geometry().unwrap();
    assert_eq!(
        f.on_frame(Geometry::new(0.0, g.scroll_height, CLIENT)),
        ScrollAction::Continue(Direction::Backward)
    );
    // Only once per completion.
    assert_eq!(
        f.on_frame(Geometry::new(0.0, g.scroll_height, CLIENT)),
        ScrollAction::None
    );
}

#[test]
fn after_layout_enters_live_once_then_pins_the_tail() {
    let mut f = FeedWindow::<Msg>::new(options());
    f.bind(geo(0.0, 0.0));
    let LayoutAction::EnterLive(live) = f.after_layout() else {
        panic!("first layout enters live");
    };
    assert_eq!(live.generation, 1);

    f.replace_results(store(1..=10));
    f.observe_geometry(geo(0.0, 500.0));
    assert_eq!(
        f.after_layout(),
        LayoutAction::Scroll(ScrollCommand { scroll_top: 300.0 })
    );
    assert_eq!(f.after_layout(), LayoutAction::None);
    assert!(f.should_auto_scroll());
}

#[test]
fn subscribers_are_notified_and_batched() {
    let (mut f, _rows) = live_feed();
    let hits = Arc::new(AtomicUsize::new(0));
    let id = f.subscribe({
        let hits = Arc::clone(&hits);
        move |_| {
            hits.fetch_add(1, Ordering::Relaxed);
        }
    });

    f.set_live_mode();
    let after_one = hits.load(Ordering::Relaxed);
    assert!(after_one >= 1);

    f.batch_update(|f| {
        f.observe_geometry(geo(10.0, 500.0));
        f.observe_geometry(geo(20.0, 500.0));
        f.set_live_mode();
    });
    assert_eq!(hits.load(Ordering::Relaxed), after_one + 1);

    assert!(f.unsubscribe(id));
    assert!(!f.unsubscribe(id));
    f.set_live_mode();
    assert_eq!(hits.load(Ordering::Relaxed), after_one + 1);
}

#[test]
fn state_snapshot_mirrors_the_feed() {
    let (mut f, rows) = live_feed();
    let _ticket = proceed(f.begin_continuation(Direction::Backward, &rows));
    let s = f.state();
    assert_eq!(s.mode, Mode::Backward);
    assert!(s.loading_backward);
    assert!(!s.loading_forward);
    assert!(s.is_loading());
    assert!(!s.should_auto_scroll());
    assert_eq!(s.limit, 10);
    assert_eq!(s.metrics.result_count, 10);
    assert_eq!(s.generation, f.generation());
}

#[test]
fn query_template_renders_each_selection_shape() {
    let t = QueryTemplate::new("room = ?", "timestamp");
    assert_eq!(
        t.render(&Selection::<i64>::live(30)),
        "room = ? ORDER BY timestamp DESC LIMIT 30"
    );
    assert_eq!(
        t.render(&Selection::continuation(Direction::Forward, 5i64, 30)),
        "room = ? AND timestamp >= ? ORDER BY timestamp ASC LIMIT 30"
    );
    let bare = QueryTemplate::new("", "ts");
    assert_eq!(
        bare.render(&Selection::continuation(Direction::Backward, 5i64, 2)),
        "ts <= ? ORDER BY ts DESC LIMIT 2"
    );
}

mod props {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Add(i64, u8),
        Remove(i64),
        Replace(u8, i64, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0i64..200, 0u8..3).prop_map(|(ts, alias)| Op::Add(ts, alias)),
            (0i64..200).prop_map(Op::Remove),
            (0u8..3, 0i64..200, 1usize..20).prop_map(|(m, k, l)| Op::Replace(m, k, l)),
        ]
    }

    fn selection(mode: u8, key: i64, limit: usize) -> Selection<i64> {
        match mode {
            0 => Selection::live(limit),
            1 => Selection::continuation(Direction::Backward, key, limit),
            _ => Selection::continuation(Direction::Forward, key, limit),
        }
    }

    proptest! {
        #[test]
        fn window_stays_bounded_unique_and_ordered(ops in proptest::collection::vec(op(), 1..60)) {
            let mut w = Window::<Msg>::new(Selection::live(8));
            for op in ops {
                match op {
                    // `alias` lets the same identity come back under another key.
                    Op::Add(ts, alias) => {
                        let id = 1000 + (ts as u64 % 50) + alias as u64 * 50;
                        w.apply_changeset(Changeset { adds: vec![Msg { id, ts }], removes: vec![] });
                    }
                    Op::Remove(ts) => {
                        w.apply_changeset(Changeset { adds: vec![], removes: vec![msg(ts).id] });
                    }
                    Op::Replace(mode, key, limit) => {
                        let sel = selection(mode, key, limit);
                        w.replace(sel, (0..200).step_by(3).map(msg));
                    }
                }
                prop_assert!(w.len() <= w.limit());
                prop_assert!(w.is_well_formed());
            }
        }

        #[test]
        fn display_is_ascending(mode in 0u8..3, key in 0i64..200, limit in 1usize..30) {
            let mut w = Window::<Msg>::new(Selection::live(1));
            w.replace(selection(mode, key, limit), store(0..=199));
            let display = w.display();
            prop_assert!(display.windows(2).all(|p| p[0].ts < p[1].ts));
        }
    }
}
