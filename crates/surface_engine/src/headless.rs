//! Headless render backend
//!
//! Records frames instead of rasterizing. This is the backend used by the
//! crate's own session tests and by hosts that embed the engine without a
//! display (CI, server-side layout checks). The paired [`HeadlessControl`]
//! handle plays the platform: it reports surface readiness and resizes, and
//! can inject per-window or fatal failures.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::backend::{BackendResult, RenderBackend, SurfaceBinding};
use crate::command::EventPayload;
use crate::error::SessionError;
use crate::properties::PropertySet;
use crate::surface::{SurfaceExtent, SurfaceRef};

/// Snapshot of one rendered frame
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Surface the frame was rendered to
    pub surface: SurfaceRef,
    /// Properties in effect when the frame rendered
    pub properties: PropertySet,
    /// Extent the binding was configured for
    pub extent: SurfaceExtent,
}

#[derive(Default)]
struct HeadlessState {
    extents: HashMap<SurfaceRef, SurfaceExtent>,
    failing: HashSet<SurfaceRef>,
    fatal: bool,
    frames: Vec<FrameRecord>,
    reconfigures: Vec<(SurfaceRef, SurfaceExtent)>,
    events: Vec<(SurfaceRef, EventPayload)>,
}

/// Control and inspection handle paired with a [`HeadlessBackend`]
///
/// Cloneable and thread-safe; a host (or test) drives surface readiness from
/// any thread while the run loop owns the backend.
#[derive(Clone)]
pub struct HeadlessControl {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessControl {
    /// Mark a surface ready (or resized) at the given extent
    pub fn set_extent(&self, surface: &SurfaceRef, extent: SurfaceExtent) {
        self.inner
            .lock()
            .unwrap()
            .extents
            .insert(surface.clone(), extent);
    }

    /// Make every render against `surface` fail with a renderer error
    pub fn fail_renders_for(&self, surface: &SurfaceRef) {
        self.inner.lock().unwrap().failing.insert(surface.clone());
    }

    /// Stop failing renders against `surface`
    pub fn clear_render_failure(&self, surface: &SurfaceRef) {
        self.inner.lock().unwrap().failing.remove(surface);
    }

    /// Fail the next backend operation with a fatal platform error
    pub fn trigger_fatal(&self) {
        self.inner.lock().unwrap().fatal = true;
    }

    /// Every frame rendered so far, in render order
    pub fn frames(&self) -> Vec<FrameRecord> {
        self.inner.lock().unwrap().frames.clone()
    }

    /// Frames rendered to one surface, in render order
    pub fn frames_for(&self, surface: &SurfaceRef) -> Vec<FrameRecord> {
        self.inner
            .lock()
            .unwrap()
            .frames
            .iter()
            .filter(|f| &f.surface == surface)
            .cloned()
            .collect()
    }

    /// Number of frames rendered to one surface
    pub fn frame_count_for(&self, surface: &SurfaceRef) -> usize {
        self.inner
            .lock()
            .unwrap()
            .frames
            .iter()
            .filter(|f| &f.surface == surface)
            .count()
    }

    /// Reconfigure calls observed for one surface, in order
    pub fn reconfigures_for(&self, surface: &SurfaceRef) -> Vec<SurfaceExtent> {
        self.inner
            .lock()
            .unwrap()
            .reconfigures
            .iter()
            .filter(|(s, _)| s == surface)
            .map(|(_, e)| *e)
            .collect()
    }

    /// Events delivered to one surface's binding, in order
    pub fn events_for(&self, surface: &SurfaceRef) -> Vec<EventPayload> {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|(s, _)| s == surface)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

/// Backend that records frames instead of rasterizing
pub struct HeadlessBackend {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessBackend {
    /// Create a backend and its control handle
    pub fn new() -> (Self, HeadlessControl) {
        let inner = Arc::new(Mutex::new(HeadlessState::default()));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            HeadlessControl { inner },
        )
    }
}

impl RenderBackend for HeadlessBackend {
    fn surface_extent(&self, surface: &SurfaceRef) -> Option<SurfaceExtent> {
        self.inner.lock().unwrap().extents.get(surface).copied()
    }

    fn create_binding(
        &mut self,
        surface: &SurfaceRef,
        extent: SurfaceExtent,
    ) -> BackendResult<Box<dyn SurfaceBinding>> {
        if self.inner.lock().unwrap().fatal {
            return Err(SessionError::FatalPlatformError(
                "display system lost".to_string(),
            ));
        }
        Ok(Box::new(HeadlessBinding {
            surface: surface.clone(),
            extent,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct HeadlessBinding {
    surface: SurfaceRef,
    extent: SurfaceExtent,
    inner: Arc<Mutex<HeadlessState>>,
}

impl SurfaceBinding for HeadlessBinding {
    fn render(&mut self, props: &PropertySet) -> BackendResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.fatal {
            return Err(SessionError::FatalPlatformError(
                "display system lost".to_string(),
            ));
        }
        if state.failing.contains(&self.surface) {
            return Err(SessionError::RendererError(format!(
                "injected failure on {}",
                self.surface
            )));
        }
        state.frames.push(FrameRecord {
            surface: self.surface.clone(),
            properties: props.clone(),
            extent: self.extent,
        });
        Ok(())
    }

    fn reconfigure(&mut self, extent: SurfaceExtent) -> BackendResult<()> {
        self.extent = extent;
        self.inner
            .lock()
            .unwrap()
            .reconfigures
            .push((self.surface.clone(), extent));
        Ok(())
    }

    fn handle_event(&mut self, event: &EventPayload) {
        self.inner
            .lock()
            .unwrap()
            .events
            .push((self.surface.clone(), event.clone()));
    }
}
