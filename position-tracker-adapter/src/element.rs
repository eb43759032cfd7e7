use core::cell::Cell;

use position_tracker::{Element, Error, Rect, TrackerResult};

/// An element whose bounding rectangle is set by the host.
#[derive(Debug)]
pub struct MovableElement {
    rect: Cell<Rect>,
    queries: Cell<u64>,
    connected: Cell<bool>,
}

impl MovableElement {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: Cell::new(rect),
            queries: Cell::new(0),
            connected: Cell::new(true),
        }
    }

    pub fn move_to(&self, rect: Rect) {
        self.rect.set(rect);
    }

    /// Shifts the element in viewport coordinates, e.g. `dy = -15.0` after scrolling down 15px.
    pub fn translate(&self, dx: f64, dy: f64) {
        let r = self.rect.get();
        self.rect.set(Rect {
            x: r.x + dx,
            y: r.y + dy,
            top: r.top + dy,
            left: r.left + dx,
            bottom: r.bottom + dy,
            right: r.right + dx,
        });
    }

    /// Geometry queries answered so far, including failed ones.
    pub fn query_count(&self) -> u64 {
        self.queries.get()
    }

    /// Removes the element from the document; geometry queries fail until reconnected.
    pub fn detach_from_document(&self) {
        self.connected.set(false);
    }

    pub fn reconnect(&self) {
        self.connected.set(true);
    }
}

impl Element for MovableElement {
    fn bounding_client_rect(&self) -> TrackerResult<Rect> {
        self.queries.set(self.queries.get().saturating_add(1));
        if !self.connected.get() {
            return Err(Error::Detached);
        }
        Ok(self.rect.get())
    }
}
