//! # Surface Engine
//!
//! A session manager for an embeddable rendering engine: a handle-based
//! registry of logical windows multiplexed onto drawable surfaces, driven
//! by a run loop that owns its thread and accepts commands over a
//! cloneable proxy channel.
//!
//! ## Design
//!
//! - **Single writer**: one thread runs the loop and owns the registry and
//!   every renderer binding; no locks on window state.
//! - **Proxy channel**: any number of producers enqueue commands without
//!   blocking; per-producer FIFO order is preserved.
//! - **Lazy bindings**: a window's renderer resources are created on the
//!   first tick its surface is ready, reconfigured in place on resize, and
//!   dropped synchronously on removal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use surface_engine::prelude::*;
//! use std::thread;
//!
//! fn main() -> Result<(), SessionError> {
//!     let (backend, control) = HeadlessBackend::new();
//!     control.set_extent(&SurfaceRef::new("canvas1"), SurfaceExtent::new(640, 480));
//!
//!     let session = Session::new(SessionConfig::default(), Box::new(backend));
//!     // Take the proxy before run(): nothing after run() executes while
//!     // the loop is alive.
//!     let proxy = session.proxy();
//!
//!     thread::spawn(move || -> Result<(), SessionError> {
//!         let w1 = proxy.create_window(SurfaceRef::new("canvas1"))?;
//!         proxy.update_property(PropertyTarget::Window(w1), "red", PropertyValue::Int(128))?;
//!         proxy.shutdown()
//!     });
//!
//!     session.run() // blocks until shutdown
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod backend;
pub mod command;
pub mod config;
pub mod headless;
pub mod logging;
pub mod properties;
pub mod registry;
pub mod surface;
pub mod timing;

mod error;
mod proxy;
mod session;

pub use error::SessionError;
pub use proxy::SessionProxy;
pub use session::{Session, TerminationObserver};

/// Common imports for engine embedders
pub mod prelude {
    pub use crate::{
        backend::{RenderBackend, SurfaceBinding},
        command::{EventPayload, PropertyTarget},
        config::{Config, SessionConfig},
        headless::{HeadlessBackend, HeadlessControl},
        properties::{PropertySet, PropertyValue},
        registry::WindowHandle,
        surface::{SurfaceExtent, SurfaceRef},
        Session, SessionError, SessionProxy,
    };
}
