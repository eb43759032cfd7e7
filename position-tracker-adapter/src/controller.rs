use alloc::rc::Rc;

use position_tracker::{
    Element, EventKind, PositionTracker, Rect, TrackerOptions, TrackerResult,
};

use crate::{HostSnapshot, ManualFrameScheduler, ManualWindow};

/// A framework-neutral host that owns a [`PositionTracker`] together with the frame loop and
/// window it is wired to.
///
/// This type does not hold any UI objects. Hosts drive it by calling:
/// - `on_resize` / `on_scroll` when the UI reports window events
/// - `tick(now_ms)` once per frame, which fires the coalesced recomputation
#[derive(Debug)]
pub struct Controller<E: ?Sized + 'static = dyn Element> {
    scheduler: Rc<ManualFrameScheduler>,
    window: Rc<ManualWindow>,
    tracker: PositionTracker<E>,
}

impl<E: Element + ?Sized + 'static> Controller<E> {
    pub fn new(options: TrackerOptions) -> Self {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let window = Rc::new(ManualWindow::new());
        let tracker = PositionTracker::new(scheduler.clone(), window.clone(), options);
        Self {
            scheduler,
            window,
            tracker,
        }
    }

    pub fn tracker(&self) -> &PositionTracker<E> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PositionTracker<E> {
        &mut self.tracker
    }

    pub fn scheduler(&self) -> &Rc<ManualFrameScheduler> {
        &self.scheduler
    }

    pub fn window(&self) -> &Rc<ManualWindow> {
        &self.window
    }

    pub fn rect(&self) -> Rc<Rect> {
        self.tracker.rect()
    }

    /// Associates the tracker with `element` (or with nothing).
    pub fn set_element(&mut self, element: Option<Rc<E>>) -> TrackerResult<()> {
        self.tracker.set_element(element)
    }

    /// Call this when the UI reports a window resize. Returns how many listeners ran.
    pub fn on_resize(&self) -> usize {
        self.window.dispatch(EventKind::Resize)
    }

    /// Call this when the UI reports a window scroll. Returns how many listeners ran.
    pub fn on_scroll(&self) -> usize {
        self.window.dispatch(EventKind::Scroll)
    }

    /// Advances one frame.
    ///
    /// Returns the new rectangle if the frame changed it, `None` otherwise.
    pub fn tick(&mut self, now_ms: u64) -> Option<Rc<Rect>> {
        let before = self.tracker.rect();
        let _fired = self.scheduler.run_frame(now_ms);
        let after = self.tracker.rect();
        let changed = !Rc::ptr_eq(&before, &after);
        atrace!(now_ms, fired = _fired, changed, "Controller::tick");
        changed.then_some(after)
    }

    pub fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            rect: *self.tracker.rect(),
            state: self.tracker.state(),
            update_pending: self.tracker.is_update_pending(),
            pending_frames: self.scheduler.pending_frames(),
            frame_count: self.scheduler.frame_count(),
            last_frame_ms: self.scheduler.last_frame_ms(),
            resize_listeners: self.window.listener_count(EventKind::Resize),
            scroll_listeners: self.window.listener_count(EventKind::Scroll),
        }
    }
}

impl<E: Element + ?Sized + 'static> Default for Controller<E> {
    fn default() -> Self {
        Self::new(TrackerOptions::default())
    }
}
