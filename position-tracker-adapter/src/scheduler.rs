use alloc::collections::VecDeque;
use core::cell::{Cell, RefCell};
use core::fmt;

use position_tracker::{FrameCallback, FrameId, FrameScheduler};

/// A frame scheduler driven by the host's own loop.
///
/// Callbacks queue up until [`ManualFrameScheduler::run_frame`] is called. A frame runs exactly
/// the callbacks requested before it started; callbacks requested while it runs wait for the
/// next frame, like `requestAnimationFrame` in a browser.
#[derive(Default)]
pub struct ManualFrameScheduler {
    queue: RefCell<VecDeque<(FrameId, FrameCallback)>>,
    next_id: Cell<u64>,
    frame_count: Cell<u64>,
    last_frame_ms: Cell<Option<u64>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one frame at `now_ms` and returns how many callbacks fired.
    pub fn run_frame(&self, now_ms: u64) -> usize {
        if let Some(last) = self.last_frame_ms.get() {
            if now_ms < last {
                awarn!(last, now_ms, "ManualFrameScheduler: frame time went backwards");
            }
        }
        self.last_frame_ms.set(Some(now_ms));
        self.frame_count.set(self.frame_count.get().saturating_add(1));

        let batch = core::mem::take(&mut *self.queue.borrow_mut());
        let fired = batch.len();
        for (_id, callback) in batch {
            atrace!(frame = _id.0, now_ms, "ManualFrameScheduler: firing");
            callback();
        }
        fired
    }

    /// Callbacks waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count.get()
    }

    pub fn last_frame_ms(&self) -> Option<u64> {
        self.last_frame_ms.get()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId {
        let id = FrameId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.queue.borrow_mut().push_back((id, callback));
        id
    }
}

impl fmt::Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrameScheduler")
            .field("pending_frames", &self.pending_frames())
            .field("frame_count", &self.frame_count.get())
            .field("last_frame_ms", &self.last_frame_ms.get())
            .finish()
    }
}
