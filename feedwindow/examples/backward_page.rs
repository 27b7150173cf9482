// Example: one backward continuation driven by hand, without an adapter.
use std::collections::HashMap;

use feedwindow::{
    Completion, ContinuationStart, Direction, FeedItem, FeedOptions, FeedWindow, Geometry,
    QueryTemplate, RowLayout, ScrollAction, Selection,
};

#[derive(Clone, Debug)]
struct Message {
    id: u64,
    sent_at: i64,
}

impl FeedItem for Message {
    type Key = i64;
    type Id = u64;

    fn key(&self) -> i64 {
        self.sent_at
    }

    fn id(&self) -> u64 {
        self.id
    }
}

/// Every row is 40px tall, stacked in display order.
struct Rows(HashMap<u64, f64>);

impl Rows {
    fn layout(items: &[Message]) -> Self {
        Self(
            items
                .iter()
                .enumerate()
                .map(|(i, m)| (m.id, i as f64 * 40.0))
                .collect(),
        )
    }

    fn height(&self) -> f64 {
        self.0.len() as f64 * 40.0
    }
}

impl RowLayout<u64> for Rows {
    fn row_height(&self, id: &u64) -> Option<f64> {
        self.0.get(id).map(|_| 40.0)
    }

    fn row_offset(&self, id: &u64) -> Option<f64> {
        self.0.get(id).copied()
    }
}

fn query(store: &[Message], selection: &Selection<i64>) -> Vec<Message> {
    let mut out: Vec<Message> = store
        .iter()
        .filter(|m| selection.admits(&m.sent_at))
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        if selection.precedes(&a.sent_at, &b.sent_at) {
            std::cmp::Ordering::Less
        } else if selection.precedes(&b.sent_at, &a.sent_at) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    out.truncate(selection.limit);
    out
}

fn main() {
    let store: Vec<Message> = (1..=500).map(|i| Message { id: i as u64, sent_at: i }).collect();
    let template = QueryTemplate::new("room_id = ?", "sent_at");
    let client_height = 400.0;

    let mut feed = FeedWindow::<Message>::new(FeedOptions::default());
    feed.bind(Geometry::new(0.0, 0.0, client_height));

    let live = feed.set_live_mode();
    println!("live: {}", template.render(&live.selection));
    feed.replace_results(query(&store, &live.selection));
    let rows = Rows::layout(&feed.items());
    feed.observe_geometry(Geometry::new(0.0, rows.height(), client_height));
    if let Some(cmd) = feed.scroll_to_bottom() {
        println!("scroll to bottom: {}", cmd.scroll_top);
    }
    feed.on_frame(Geometry::new(rows.height() - client_height, rows.height(), client_height));

    // The user flings to the top.
    feed.note_user_gesture();
    let action = feed.on_scroll(Geometry::new(0.0, rows.height(), client_height));
    println!("action: {action:?}");
    let ScrollAction::Continue(Direction::Backward) = action else {
        return;
    };

    let ContinuationStart::Proceed(ticket) = feed.begin_continuation(Direction::Backward, &rows)
    else {
        return;
    };
    println!(
        "anchor={:?} requery: {}",
        ticket.anchor().key,
        template.render(ticket.selection())
    );
    feed.replace_results(query(&store, ticket.selection()));
    let rows = Rows::layout(&feed.items());
    feed.observe_geometry(Geometry::new(0.0, rows.height(), client_height));
    if let Completion::Reconciled { delta, scroll } = feed.finish_continuation(ticket, &rows) {
        println!("delta={delta:?} scroll={scroll:?} state={:?}", feed.state());
    }
}
