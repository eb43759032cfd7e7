//! A headless tracker for the on-screen bounding rectangle of an element.
//!
//! For deterministic hosts (manual frame loop, in-memory window, movable elements), see the
//! `position-tracker-adapter` crate.
//!
//! The tracker recomputes an element's rectangle when the window is resized or scrolled, and
//! coalesces those recomputations to at most one per animation frame. The rectangle is held in
//! an [`Observable`] and replaced only when one of its fields actually changes.
//!
//! It is UI-agnostic. A DOM/TUI/GUI layer is expected to provide:
//! - a next-frame primitive ([`FrameScheduler`])
//! - a window-like source of `resize`/`scroll` events ([`EventTarget`])
//! - elements that can report their bounding rectangle ([`Element`])
//!
//! Everything runs on one UI thread: the types here are `!Send` and use no locks.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod coalescer;
mod completion;
mod error;
mod observable;
mod options;
mod platform;
mod tracker;
mod types;

#[cfg(test)]
mod tests;

pub use coalescer::{FrameCoalescer, Operation};
pub use completion::Completion;
pub use error::{Error, TrackerResult};
pub use observable::{Observable, Subscription};
pub use options::{OnChangeCallback, TrackerOptions};
pub use platform::{Element, EventTarget, FrameCallback, FrameScheduler, Listener};
pub use tracker::PositionTracker;
pub use types::{EventKind, FrameId, ListenerId, ListenerOptions, Rect, TrackerState};
