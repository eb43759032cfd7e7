use alloc::rc::Rc;

use crate::{ListenerOptions, Rect};

/// A callback fired after the tracked rectangle is replaced.
pub type OnChangeCallback = Rc<dyn Fn(&Rect)>;

/// Configuration for [`crate::PositionTracker`].
///
/// Cheap to clone: the callback is stored in an `Rc`, so a consumer can tweak a flag and call
/// `PositionTracker::set_options` without reallocating it.
#[derive(Clone)]
pub struct TrackerOptions {
    /// The rectangle reported before the first measurement (all zero by default).
    pub initial_rect: Rect,

    /// Recompute on window `resize`.
    pub listen_resize: bool,
    /// Recompute on window `scroll`.
    pub listen_scroll: bool,
    /// Register the scroll listener as passive so it never blocks scrolling.
    pub passive_scroll: bool,

    /// Optional callback fired whenever the rectangle changes.
    pub on_change: Option<OnChangeCallback>,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerOptions {
    pub fn new() -> Self {
        Self {
            initial_rect: Rect::default(),
            listen_resize: true,
            listen_scroll: true,
            passive_scroll: true,
            on_change: None,
        }
    }

    pub fn with_initial_rect(mut self, initial_rect: Rect) -> Self {
        self.initial_rect = initial_rect;
        self
    }

    pub fn with_listen_resize(mut self, listen_resize: bool) -> Self {
        self.listen_resize = listen_resize;
        self
    }

    pub fn with_listen_scroll(mut self, listen_scroll: bool) -> Self {
        self.listen_scroll = listen_scroll;
        self
    }

    pub fn with_passive_scroll(mut self, passive_scroll: bool) -> Self {
        self.passive_scroll = passive_scroll;
        self
    }

    pub fn with_on_change(mut self, on_change: impl Fn(&Rect) + 'static) -> Self {
        self.on_change = Some(Rc::new(on_change));
        self
    }

    pub fn without_on_change(mut self) -> Self {
        self.on_change = None;
        self
    }

    pub(crate) fn scroll_listener_options(&self) -> ListenerOptions {
        ListenerOptions {
            passive: self.passive_scroll,
        }
    }
}

impl core::fmt::Debug for TrackerOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackerOptions")
            .field("initial_rect", &self.initial_rect)
            .field("listen_resize", &self.listen_resize)
            .field("listen_scroll", &self.listen_scroll)
            .field("passive_scroll", &self.passive_scroll)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}
