use position_tracker::{Rect, TrackerState};

/// A lightweight snapshot of a [`crate::Controller`] and the host it drives.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`, which is handy for
/// golden tests and for shipping tracker state to a devtools panel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostSnapshot {
    pub rect: Rect,
    pub state: TrackerState,
    pub update_pending: bool,
    pub pending_frames: usize,
    pub frame_count: u64,
    pub last_frame_ms: Option<u64>,
    pub resize_listeners: usize,
    pub scroll_listeners: usize,
}
