use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use crate::TrackerResult;

type ResolveCallback = Box<dyn FnOnce(&TrackerResult<()>)>;

#[derive(Default)]
struct CompletionState {
    result: Option<TrackerResult<()>>,
    callbacks: Vec<ResolveCallback>,
    wakers: Vec<Waker>,
}

/// A single-resolution handle for one coalesced frame.
///
/// Every caller that hits the same coalescing window receives a clone of the same handle, and
/// all clones observe the same result. It can be polled as a `Future` or observed through
/// [`Completion::on_resolve`].
#[derive(Clone)]
pub struct Completion {
    state: Rc<RefCell<CompletionState>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(CompletionState::default())),
        }
    }

    pub(crate) fn resolve(&self, result: TrackerResult<()>) {
        let (callbacks, wakers) = {
            let mut state = self.state.borrow_mut();
            debug_assert!(state.result.is_none(), "Completion resolved twice");
            if state.result.is_some() {
                pwarn!("Completion: resolved twice, keeping the first result");
                return;
            }
            state.result = Some(result.clone());
            (
                core::mem::take(&mut state.callbacks),
                core::mem::take(&mut state.wakers),
            )
        };

        for callback in callbacks {
            callback(&result);
        }
        for waker in wakers {
            waker.wake();
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state.borrow().result.is_some()
    }

    /// Returns the operation's result once the frame has fired.
    pub fn result(&self) -> Option<TrackerResult<()>> {
        self.state.borrow().result.clone()
    }

    /// Runs `f` when the frame fires, or right away if it already has.
    pub fn on_resolve(&self, f: impl FnOnce(&TrackerResult<()>) + 'static) {
        let resolved = self.state.borrow().result.clone();
        match resolved {
            Some(result) => f(&result),
            None => self.state.borrow_mut().callbacks.push(Box::new(f)),
        }
    }

    /// Whether both handles belong to the same coalescing window.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Future for Completion {
    type Output = TrackerResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        if let Some(result) = &state.result {
            return Poll::Ready(result.clone());
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Completion")
            .field("result", &state.result)
            .field("callbacks", &state.callbacks.len())
            .finish_non_exhaustive()
    }
}
