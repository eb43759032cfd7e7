use std::rc::Rc;

use position_tracker::{Rect, TrackerOptions};
use position_tracker_adapter::{Controller, MovableElement};

fn main() {
    // Example: a host that owns its frame loop.
    //
    // The host would:
    // - forward window resize/scroll events to on_resize/on_scroll
    // - call tick(now_ms) once per frame
    // - reposition whatever follows the element when tick returns a new rect
    let mut c = Controller::<MovableElement>::new(TrackerOptions::new());
    let el = Rc::new(MovableElement::new(Rect::from_origin_size(
        40.0, 400.0, 200.0, 80.0,
    )));
    c.set_element(Some(el.clone())).expect("listeners registered");

    let mut now_ms = 0u64;
    for step in 0..10 {
        now_ms += 16;
        // A wheel burst: several scroll events land in the same frame.
        for _ in 0..4 {
            el.translate(0.0, -10.0);
            c.on_scroll();
        }
        if let Some(rect) = c.tick(now_ms) {
            println!("t={now_ms} step={step} top={} bottom={}", rect.top, rect.bottom);
        }
    }

    println!(
        "queries={} frames={} snapshot={:?}",
        el.query_count(),
        c.scheduler().frame_count(),
        c.snapshot()
    );
}
