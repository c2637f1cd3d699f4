//! Backend abstraction for the per-window renderer
//!
//! The session core treats rasterization as opaque: a backend resolves
//! surface references to drawable targets and hands out one binding per
//! window. Bindings are created lazily (only once the surface reports an
//! extent), reconfigured in place on resize, and dropped synchronously when
//! the window is removed. The run loop thread owns the backend and every
//! binding; no other thread touches them.

use crate::command::EventPayload;
use crate::error::SessionError;
use crate::properties::PropertySet;
use crate::surface::{SurfaceExtent, SurfaceRef};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, SessionError>;

/// Factory for per-window renderer bindings
///
/// An `Err(SessionError::FatalPlatformError)` from any method terminates the
/// run loop; any other error is treated as per-window and logged.
pub trait RenderBackend: Send {
    /// Current drawable extent of a surface
    ///
    /// Returns `None` while the surface is not ready to render (layout or
    /// size not yet known). The run loop polls this every tick and defers
    /// binding creation until an extent is available.
    fn surface_extent(&self, surface: &SurfaceRef) -> Option<SurfaceExtent>;

    /// Create the renderer binding for a surface at a known extent
    fn create_binding(
        &mut self,
        surface: &SurfaceRef,
        extent: SurfaceExtent,
    ) -> BackendResult<Box<dyn SurfaceBinding>>;
}

/// Per-window renderer resource
///
/// Destruction is the `Drop` impl; the registry drops the binding
/// synchronously when the owning window is removed, so no render can happen
/// against a binding once removal has begun.
pub trait SurfaceBinding {
    /// Render one frame with the window's current properties
    fn render(&mut self, props: &PropertySet) -> BackendResult<()>;

    /// Reconfigure in place after the surface changed size
    ///
    /// Resize never tears the binding down; swapchain-equivalent resources
    /// are rebuilt behind this call.
    fn reconfigure(&mut self, extent: SurfaceExtent) -> BackendResult<()>;

    /// Deliver a fanned-out event
    fn handle_event(&mut self, _event: &EventPayload) {}
}
