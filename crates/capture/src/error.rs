//! Capture-path error types.

use std::time::Duration;

use thiserror::Error;

/// Result alias for capture-path operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors produced while capturing an export.
///
/// All variants are surfaced to the user with an explicit retry affordance;
/// nothing retries automatically, since retriggering the engine's export
/// mid-capture could produce a second, conflicting delivery. Interception
/// state is guaranteed torn down before any of these propagate.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No delivery was observed within the deadline.
    #[error("no export delivery observed within {0:?}")]
    Timeout(Duration),

    /// A delivery was observed but could not be converted to bytes.
    #[error("captured payload could not be converted: {0}")]
    Failed(String),

    /// Another capture is already in flight on this bridge.
    #[error("another capture is already in flight")]
    Busy,

    /// The caller tore the capture down before the deadline.
    #[error("capture aborted before the deadline")]
    Aborted,
}

impl CaptureError {
    /// Returns `true` for deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CaptureError::Timeout(_))
    }
}
