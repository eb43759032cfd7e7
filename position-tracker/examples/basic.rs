// Example: a minimal host wiring a tracker to a hand-rolled frame queue and window.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use position_tracker::{
    Element, EventKind, EventTarget, FrameCallback, FrameId, FrameScheduler, Listener, ListenerId,
    ListenerOptions, PositionTracker, Rect, TrackerOptions, TrackerResult,
};

#[derive(Default)]
struct Frames(RefCell<Vec<FrameCallback>>, Cell<u64>);

impl FrameScheduler for Frames {
    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId {
        self.0.borrow_mut().push(callback);
        let id = FrameId(self.1.get());
        self.1.set(id.0 + 1);
        id
    }
}

impl Frames {
    fn run(&self) {
        let batch = std::mem::take(&mut *self.0.borrow_mut());
        for f in batch {
            f();
        }
    }
}

#[derive(Default)]
struct Window(RefCell<Vec<(EventKind, ListenerId, Listener)>>, Cell<u64>);

impl EventTarget for Window {
    fn add_event_listener(
        &self,
        kind: EventKind,
        listener: Listener,
        _options: ListenerOptions,
    ) -> TrackerResult<ListenerId> {
        let id = ListenerId(self.1.get());
        self.1.set(id.0 + 1);
        self.0.borrow_mut().push((kind, id, listener));
        Ok(id)
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        self.0.borrow_mut().retain(|(k, i, _)| !(*k == kind && *i == id));
    }
}

struct Card(Cell<Rect>);

impl Element for Card {
    fn bounding_client_rect(&self) -> TrackerResult<Rect> {
        Ok(self.0.get())
    }
}

fn main() {
    let frames = Rc::new(Frames::default());
    let window = Rc::new(Window::default());
    let mut tracker: PositionTracker<Card> = PositionTracker::new(
        frames.clone(),
        window.clone(),
        TrackerOptions::new().with_on_change(|r: &Rect| println!("changed: {r:?}")),
    );

    let el = Rc::new(Card(Cell::new(Rect::from_origin_size(10.0, 20.0, 100.0, 100.0))));
    tracker
        .set_element(Some(el.clone()))
        .expect("listeners registered");
    frames.run();

    // Three scroll events in one frame: a single geometry query.
    el.0.set(Rect::from_origin_size(10.0, 5.0, 100.0, 100.0));
    for _ in 0..3 {
        let listeners: Vec<Listener> = window
            .0
            .borrow()
            .iter()
            .filter(|(k, _, _)| *k == EventKind::Scroll)
            .map(|(_, _, l)| l.clone())
            .collect();
        for l in listeners {
            l();
        }
    }
    frames.run();
    println!("final rect={:?}", tracker.rect());
}
