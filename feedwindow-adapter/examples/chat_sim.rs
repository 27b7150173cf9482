// Example: a simulated chat viewport driven by `Controller` over an in-memory feed.
//
// The container below stands in for a real scroll element: it stacks rows of a fixed height,
// records listener registrations, and clamps scroll offsets like a browser would.
use feedwindow::{FeedItem, FeedOptions, Geometry, RowLayout, ScrollAction};
use feedwindow_adapter::{
    Controller, ListenerOptions, ListenerTarget, MemoryFeed, ScrollContainer, ViewportEvent,
};
use futures::executor::block_on;

#[derive(Clone, Debug)]
struct Message {
    id: u64,
    sent_at: i64,
    text: String,
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

const ROW: f64 = 36.0;

struct Viewport {
    scroll_top: f64,
    client_height: f64,
    rows: Vec<u64>,
    listeners: usize,
}

impl Viewport {
    fn content_height(&self) -> f64 {
        self.rows.len() as f64 * ROW
    }

    fn clamp(&self, scroll_top: f64) -> f64 {
        scroll_top.clamp(0.0, (self.content_height() - self.client_height).max(0.0))
    }
}

impl RowLayout<u64> for Viewport {
    fn row_height(&self, id: &u64) -> Option<f64> {
        self.rows.contains(id).then_some(ROW)
    }

    fn row_offset(&self, id: &u64) -> Option<f64> {
        let index = self.rows.iter().position(|r| r == id)?;
        Some(index as f64 * ROW)
    }
}

impl ListenerTarget for Viewport {
    type ContainerId = &'static str;
    type Listener = ViewportEvent;

    fn container_id(&self) -> &'static str {
        "chat"
    }

    fn add_listener(&mut self, event: ViewportEvent, options: ListenerOptions) -> ViewportEvent {
        println!("listen {} passive={}", event.as_str(), options.passive);
        self.listeners += 1;
        event
    }

    fn remove_listener(&mut self, listener: ViewportEvent) {
        println!("unlisten {}", listener.as_str());
        self.listeners -= 1;
    }
}

impl ScrollContainer<Message> for Viewport {
    fn geometry(&self) -> Geometry {
        Geometry::new(self.scroll_top, self.content_height(), self.client_height)
    }

    fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = self.clamp(scroll_top);
    }

    fn render(&mut self, items: &[Message]) {
        self.rows = items.iter().map(|m| m.id).collect();
        self.scroll_top = self.clamp(self.scroll_top);
    }
}

fn message(i: i64) -> Message {
    Message {
        id: i as u64,
        sent_at: 1_700_000_000 + i * 30,
        text: format!("message #{i}"),
    }
}

fn main() {
    let feed = MemoryFeed::from_items((1..=1_000).map(message));
    let mut c = Controller::new(FeedOptions::default(), feed);
    c.bind_container(Some(Viewport {
        scroll_top: 0.0,
        client_height: 480.0,
        rows: Vec::new(),
        listeners: 0,
    }));

    if let Err(err) = block_on(c.after_layout()) {
        eprintln!("{err}");
        return;
    }
    c.on_frame();
    let last = c.items().last().map(|m| m.text.clone());
    println!("live: {} items, newest={last:?}", c.items().len());

    // Fling to the top a few times.
    for _ in 0..3 {
        if let Some(v) = c.container_mut() {
            v.scroll_top = 0.0;
        }
        c.handle_event(ViewportEvent::Wheel);
        let action = c.handle_event(ViewportEvent::Scroll);
        match block_on(c.settle(action, 8)) {
            Ok(loads) => println!(
                "loads={loads} mode={} first={:?} scroll_top={:?}",
                c.mode(),
                c.items().first().map(|m| m.sent_at),
                c.container().map(|v| v.scroll_top)
            ),
            Err(err) => eprintln!("{err}"),
        }
    }

    // A new message arrives while paged back: nothing moves until the user sends one.
    let changeset = c.query_mut().insert(message(1_001));
    println!("changeset applied={}", c.on_changeset(changeset));
    if let Err(err) = block_on(c.on_item_sent()) {
        eprintln!("{err}");
    }
    println!(
        "after send: mode={} newest={:?}",
        c.mode(),
        c.items().last().map(|m| m.text.clone())
    );

    // Scrolling down at the bottom does nothing while live.
    c.handle_event(ViewportEvent::Wheel);
    let action = c.handle_event(ViewportEvent::Scroll);
    println!("at tail: action={action:?} live={}", action == ScrollAction::None);

    if let Some(v) = c.destroy() {
        println!("released, listeners left={}", v.listeners);
    }
}
