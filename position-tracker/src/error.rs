use alloc::string::String;

use crate::EventKind;

pub type TrackerResult<T> = Result<T, Error>;

/// Failures reported by the platform collaborators or by a coalesced operation.
///
/// An absent element is never an error: every operation degrades to a no-op instead.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("element is detached from the document")]
    Detached,

    #[error("geometry query failed: {0}")]
    Geometry(String),

    #[error("failed to register {kind} listener: {reason}")]
    Listener { kind: EventKind, reason: String },

    #[error("coalesced operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn listener(kind: EventKind, reason: impl Into<String>) -> Self {
        Self::Listener {
            kind,
            reason: reason.into(),
        }
    }

    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}
