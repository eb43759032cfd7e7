use alloc::boxed::Box;
use alloc::rc::Rc;

use crate::{EventKind, FrameId, ListenerId, ListenerOptions, Rect, TrackerResult};

/// A callback run once at the next frame boundary.
pub type FrameCallback = Box<dyn FnOnce()>;

/// An event listener. The same `Rc` may be registered for several event kinds.
pub type Listener = Rc<dyn Fn()>;

/// The host's next-frame primitive (`requestAnimationFrame` in a browser).
///
/// Implementations must not run `callback` synchronously from inside this call.
pub trait FrameScheduler {
    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId;
}

/// The host's global event source (`window` in a browser).
pub trait EventTarget {
    fn add_event_listener(
        &self,
        kind: EventKind,
        listener: Listener,
        options: ListenerOptions,
    ) -> TrackerResult<ListenerId>;

    /// Removing an unknown or already removed listener is a no-op.
    fn remove_event_listener(&self, kind: EventKind, id: ListenerId);
}

/// Something with an on-screen bounding rectangle.
pub trait Element {
    fn bounding_client_rect(&self) -> TrackerResult<Rect>;
}
