//! Commands accepted by the run loop
//!
//! Commands are immutable once enqueued. They travel over the proxy channel
//! in per-producer FIFO order and are applied exactly once by the run loop,
//! atomically with respect to rendering.

use crossbeam::channel::Sender;

use crate::error::SessionError;
use crate::properties::PropertyValue;
use crate::registry::WindowHandle;
use crate::surface::SurfaceRef;

/// One-shot reply slot filled by the run loop when it applies a command
///
/// The producer holds the receiving half. Dropping it cancels the wait; a
/// late reply then fails to send and is discarded.
pub type Reply<T> = Sender<Result<T, SessionError>>;

/// Target of a property update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTarget {
    /// One window, addressed by handle
    Window(WindowHandle),
    /// Every active window
    Broadcast,
}

/// Input or host event fanned out to every active window
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Pointer moved to the given surface-local coordinates
    PointerMoved {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Pointer button state changed
    PointerButton {
        /// Button index
        button: u8,
        /// Pressed (true) or released (false)
        pressed: bool,
    },
    /// Key state changed
    Key {
        /// Logical key name
        key: String,
        /// Pressed (true) or released (false)
        pressed: bool,
    },
    /// Application-defined payload
    Custom(String),
}

/// A command enqueued on the proxy channel
#[derive(Debug)]
pub enum Command {
    /// Register a window on a surface; answers with the new handle
    CreateWindow {
        /// Drawable target for the new window
        surface: SurfaceRef,
        /// Reply slot for the issued handle
        reply: Reply<WindowHandle>,
    },
    /// Remove a window and drop its renderer binding
    DeleteWindow(WindowHandle),
    /// Update one window's properties, or every window's
    UpdateProperty {
        /// One window or broadcast
        target: PropertyTarget,
        /// Property name
        key: String,
        /// New value (copied at send time)
        value: PropertyValue,
    },
    /// Fan an event out to every active window
    Event(EventPayload),
    /// Stop the run loop
    Shutdown,
}
