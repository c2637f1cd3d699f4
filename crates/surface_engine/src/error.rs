//! Session-level error taxonomy

use thiserror::Error;

/// Errors produced by session operations and the run loop
///
/// `InvalidHandle` and `ChannelClosed` come back synchronously to the caller
/// of the failing operation. `RendererError` is caught at the run loop
/// boundary and logged. `FatalPlatformError` terminates the run loop.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation referenced an unknown or already-removed window
    #[error("invalid window handle: {0}")]
    InvalidHandle(String),

    /// Command sent after the run loop terminated
    #[error("session channel closed")]
    ChannelClosed,

    /// Handle or renderer resource allocation failed
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Per-window renderer failure; the window stays registered
    #[error("renderer error: {0}")]
    RendererError(String),

    /// Platform failure that terminates the run loop
    #[error("fatal platform error: {0}")]
    FatalPlatformError(String),

    /// Bounded wait for a run loop reply elapsed
    #[error("timed out waiting for a reply from the run loop")]
    ReplyTimeout,
}
