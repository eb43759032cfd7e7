//! Host utilities for the `position-tracker` crate.
//!
//! The `position-tracker` crate is UI-agnostic and only talks to its host through small traits.
//! This crate provides framework-neutral implementations of those traits, plus a controller
//! that ties them together:
//!
//! - A manual frame loop (`requestAnimationFrame` driven by your own ticks)
//! - An in-memory window that dispatches `resize`/`scroll`
//! - An element whose rectangle the host moves around
//!
//! They are useful for TUIs and custom renderers that own their frame loop, and for
//! deterministic tests. This crate is intentionally framework-agnostic (no DOM bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod controller;
mod element;
mod scheduler;
mod state;
mod window;


pub use controller::Controller;
pub use element::MovableElement;
pub use scheduler::ManualFrameScheduler;
pub use state::HostSnapshot;
pub use window::ManualWindow;
