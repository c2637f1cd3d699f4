//! Cloneable command proxy into the run loop
//!
//! Once `run()` has taken the session's thread, the proxy is the only way to
//! reach it. Every clone shares one unbounded queue; sends never block the
//! producer, and commands from a single producer are applied in send order.

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::command::{Command, EventPayload, PropertyTarget};
use crate::error::SessionError;
use crate::properties::PropertyValue;
use crate::registry::WindowHandle;
use crate::surface::SurfaceRef;

/// Cloneable send handle into a session's run loop
///
/// Obtain proxies from [`Session::proxy`](crate::Session::proxy) before
/// calling `run()`. Independent UI lifecycles each hold their own clone;
/// their commands interleave on the shared queue without interfering.
#[derive(Clone)]
pub struct SessionProxy {
    tx: Sender<Command>,
    reply_timeout: Duration,
}

impl SessionProxy {
    pub(crate) fn new(tx: Sender<Command>, reply_timeout: Duration) -> Self {
        Self { tx, reply_timeout }
    }

    /// Register a window on `surface` and wait for its handle
    ///
    /// This is the one blocking call on the proxy: it suspends until the run
    /// loop applies the command, bounded by the configured reply timeout.
    pub fn create_window(&self, surface: SurfaceRef) -> Result<WindowHandle, SessionError> {
        self.create_window_timeout(surface, self.reply_timeout)
    }

    /// [`create_window`](Self::create_window) with an explicit wait bound
    ///
    /// On timeout the reply slot is dropped; if the loop answers later the
    /// reply is discarded, not applied anywhere.
    pub fn create_window_timeout(
        &self,
        surface: SurfaceRef,
        timeout: Duration,
    ) -> Result<WindowHandle, SessionError> {
        let (reply, reply_rx) = bounded(1);
        self.send(Command::CreateWindow { surface, reply })?;
        match reply_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SessionError::ReplyTimeout),
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::ChannelClosed),
        }
    }

    /// Remove a window and release its renderer binding
    ///
    /// Fire-and-forget: an invalid handle is reported in the run loop's log,
    /// not returned here. The `Err` case covers a terminated loop only.
    pub fn delete_window(&self, handle: WindowHandle) -> Result<(), SessionError> {
        self.send(Command::DeleteWindow(handle))
    }

    /// Update a property on one window or broadcast it to all
    pub fn update_property(
        &self,
        target: PropertyTarget,
        key: impl Into<String>,
        value: PropertyValue,
    ) -> Result<(), SessionError> {
        self.send(Command::UpdateProperty {
            target,
            key: key.into(),
            value,
        })
    }

    /// Fan an event out to every active window
    pub fn send_event(&self, event: EventPayload) -> Result<(), SessionError> {
        self.send(Command::Event(event))
    }

    /// Ask the run loop to stop
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx.send(command).map_err(|_| SessionError::ChannelClosed)
    }
}
