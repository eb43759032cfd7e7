use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::{Completion, FrameScheduler, TrackerResult};

/// The operation wrapped by a [`FrameCoalescer`].
pub type Operation = Rc<dyn Fn() -> TrackerResult<()>>;

struct Shared {
    scheduler: Rc<dyn FrameScheduler>,
    operation: Operation,
    // A requested frame and a pending completion are one state: both are set together by
    // `invoke` and cleared together when the frame fires.
    pending: RefCell<Option<Completion>>,
    executions: Cell<u64>,
}

/// Runs an operation at most once per frame, no matter how often it is requested.
///
/// This is frame-based coalescing, not time-based debouncing: the window closes at the next
/// frame boundary provided by the [`FrameScheduler`], not after a fixed delay.
///
/// Cloning a coalescer yields another handle to the same window.
#[derive(Clone)]
pub struct FrameCoalescer {
    shared: Rc<Shared>,
}

impl FrameCoalescer {
    pub fn new(
        scheduler: Rc<dyn FrameScheduler>,
        operation: impl Fn() -> TrackerResult<()> + 'static,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                scheduler,
                operation: Rc::new(operation),
                pending: RefCell::new(None),
                executions: Cell::new(0),
            }),
        }
    }

    /// Requests a run of the operation at the next frame boundary.
    ///
    /// While a frame is scheduled, further calls schedule nothing and return a clone of the
    /// pending [`Completion`].
    pub fn invoke(&self) -> Completion {
        if let Some(pending) = self.shared.pending.borrow().as_ref() {
            return pending.clone();
        }

        let completion = Completion::new();
        *self.shared.pending.borrow_mut() = Some(completion.clone());

        let shared = Rc::clone(&self.shared);
        let fired = completion.clone();
        let _frame = self
            .shared
            .scheduler
            .request_animation_frame(Box::new(move || shared.fire(fired)));
        ptrace!(frame = _frame.0, "FrameCoalescer: frame requested");

        completion
    }

    /// Whether a frame is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.shared.pending.borrow().is_some()
    }

    /// How many frames have run the operation so far.
    pub fn executions(&self) -> u64 {
        self.shared.executions.get()
    }
}

impl Shared {
    fn fire(&self, completion: Completion) {
        // Clear the window first so the operation (or anything it triggers) can open a new one.
        let current = self.pending.borrow_mut().take();
        if current.as_ref().is_some_and(|c| !c.ptr_eq(&completion)) {
            pwarn!("FrameCoalescer: fired frame does not own the pending completion");
        }
        debug_assert!(
            current.as_ref().is_none_or(|c| c.ptr_eq(&completion)),
            "FrameCoalescer: fired frame does not own the pending completion"
        );

        self.executions.set(self.executions.get().saturating_add(1));
        ptrace!(executions = self.executions.get(), "FrameCoalescer: frame fired");

        let result = (self.operation)();
        if let Err(_err) = &result {
            pwarn!(error = %_err, "FrameCoalescer: operation failed");
        }
        completion.resolve(result);
    }
}

impl fmt::Debug for FrameCoalescer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCoalescer")
            .field("pending", &self.is_pending())
            .field("executions", &self.executions())
            .finish_non_exhaustive()
    }
}
