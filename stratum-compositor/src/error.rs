// stratum-compositor/src/error.rs

//! Error types for the window graph.
//!
//! Three classes matter to callers:
//! - [`CompositorError::Protocol`]: the client broke protocol rules. Posted to
//!   that client as a fault; the connection stays up.
//! - [`CompositorError::StaleWindow`]: an operation named a window that no
//!   longer exists. Logged and ignored.
//! - [`CompositorError::ResourceExhausted`]: a new object could not be
//!   allocated. The client gets a no-memory notice and the request is dropped.

use crate::window::WindowId;
use serde::Serialize;
use std::fmt;
use stratum_core::CoreError;
use thiserror::Error;

/// Protocol-level fault codes reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolErrorKind {
    /// The surface already carries a different role.
    Role,
    /// A request named an object owned by another client or a dead object.
    InvalidObject,
    /// Parent relation would create a cycle or names an invalid parent.
    InvalidParent,
    /// The ack-configure serial was never sent.
    InvalidSerial,
    /// Layer-surface size cannot be negotiated with the given anchors.
    InvalidSize,
    /// Activation token was already consumed, or set after commit.
    AlreadyUsed,
    /// Another client already holds the menu server registration.
    AlreadyRegistered,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolErrorKind::Role => "role",
            ProtocolErrorKind::InvalidObject => "invalid_object",
            ProtocolErrorKind::InvalidParent => "invalid_parent",
            ProtocolErrorKind::InvalidSerial => "invalid_serial",
            ProtocolErrorKind::InvalidSize => "invalid_size",
            ProtocolErrorKind::AlreadyUsed => "already_used",
            ProtocolErrorKind::AlreadyRegistered => "already_registered",
        };
        f.write_str(name)
    }
}

/// A protocol violation by a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("protocol error ({kind}): {message}")]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    pub message: String,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("window {0} is not registered")]
    StaleWindow(WindowId),

    #[error("resource limit reached ({limit} windows)")]
    ResourceExhausted { limit: usize },

    #[error("event loop error: {0}")]
    EventLoop(String),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

pub type CompositorResult<T> = Result<T, CompositorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_formats_kind_and_message() {
        let err = ProtocolError::new(ProtocolErrorKind::AlreadyUsed, "token abc was consumed");
        assert_eq!(err.to_string(), "protocol error (already_used): token abc was consumed");
    }

    #[test]
    fn protocol_error_is_transparent_in_compositor_error() {
        let err: CompositorError = ProtocolError::new(ProtocolErrorKind::Role, "x").into();
        assert_eq!(err.to_string(), "protocol error (role): x");
    }

    #[test]
    fn stale_window_formats_id() {
        let err = CompositorError::StaleWindow(WindowId::from_raw(7));
        assert_eq!(err.to_string(), "window #7 is not registered");
    }
}
