//! Window registry: handle -> live window state
//!
//! The registry is a pure data structure owned by the run loop for its
//! entire lifetime. Handles are slotmap keys: versioned slots guarantee
//! that a handle issued by one `create` never compares equal to a handle
//! issued by a later `create`, even when the slot itself is recycled.

use slotmap::{new_key_type, SlotMap};

use crate::backend::SurfaceBinding;
use crate::command::{EventPayload, PropertyTarget};
use crate::error::SessionError;
use crate::properties::{PropertySet, PropertyValue};
use crate::surface::{SurfaceExtent, SurfaceRef};

new_key_type! {
    /// Opaque handle to a registered window
    ///
    /// Valid from the application of its CreateWindow command until the
    /// application of its DeleteWindow command; never reused afterwards.
    pub struct WindowHandle;
}

/// Live state for one registered window
///
/// Owned exclusively by the registry; external callers only ever hold the
/// handle.
pub struct WindowState {
    pub(crate) surface: SurfaceRef,
    pub(crate) props: PropertySet,
    /// Renderer binding, `None` until the first render tick where the
    /// surface reports an extent
    pub(crate) binding: Option<Box<dyn SurfaceBinding>>,
    /// Extent the binding was last configured for
    pub(crate) extent: Option<SurfaceExtent>,
}

impl WindowState {
    fn new(surface: SurfaceRef) -> Self {
        Self {
            surface,
            props: PropertySet::new(),
            binding: None,
            extent: None,
        }
    }

    /// The surface this window draws to
    pub fn surface(&self) -> &SurfaceRef {
        &self.surface
    }

    /// The window's current properties
    pub fn properties(&self) -> &PropertySet {
        &self.props
    }
}

/// Handle-keyed map of active windows
pub struct WindowRegistry {
    windows: SlotMap<WindowHandle, WindowState>,
    max_windows: usize,
}

impl WindowRegistry {
    /// Create a registry capped at `max_windows` entries
    pub fn new(max_windows: usize) -> Self {
        Self {
            windows: SlotMap::with_key(),
            max_windows,
        }
    }

    /// Register a window on `surface` and issue a fresh handle
    ///
    /// Fails only with [`SessionError::ResourceExhausted`] when the registry
    /// is at capacity. The renderer binding stays empty until the first
    /// render tick where the surface is ready.
    pub fn create(&mut self, surface: SurfaceRef) -> Result<WindowHandle, SessionError> {
        if self.windows.len() >= self.max_windows {
            return Err(SessionError::ResourceExhausted(format!(
                "window registry at capacity ({})",
                self.max_windows
            )));
        }
        let handle = self.windows.insert(WindowState::new(surface));
        log::debug!("window {handle:?} registered");
        Ok(handle)
    }

    /// Remove a window, dropping its renderer binding synchronously
    ///
    /// An unknown handle fails with [`SessionError::InvalidHandle`]. Double
    /// delete is a caller bug the registry surfaces rather than swallows.
    pub fn remove(&mut self, handle: WindowHandle) -> Result<(), SessionError> {
        match self.windows.remove(handle) {
            // Dropping WindowState drops the binding here, before remove
            // returns to the run loop.
            Some(_state) => {
                log::debug!("window {handle:?} removed");
                Ok(())
            }
            None => Err(SessionError::InvalidHandle(format!("{handle:?}"))),
        }
    }

    /// Update a property on one window or on every window
    ///
    /// An unknown target handle fails with [`SessionError::InvalidHandle`]
    /// and leaves every existing property set untouched.
    pub fn update_property(
        &mut self,
        target: PropertyTarget,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), SessionError> {
        match target {
            PropertyTarget::Window(handle) => {
                let window = self
                    .windows
                    .get_mut(handle)
                    .ok_or_else(|| SessionError::InvalidHandle(format!("{handle:?}")))?;
                window.props.set(key, value);
                Ok(())
            }
            PropertyTarget::Broadcast => {
                for window in self.windows.values_mut() {
                    window.props.set(key, value.clone());
                }
                Ok(())
            }
        }
    }

    /// Deliver an event to every window that already has a binding
    pub fn dispatch_event(&mut self, event: &EventPayload) {
        for window in self.windows.values_mut() {
            if let Some(binding) = window.binding.as_mut() {
                binding.handle_event(event);
            }
        }
    }

    /// Whether a handle currently refers to an active window
    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.windows.contains_key(handle)
    }

    /// Number of active windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no windows are active
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Look up a window's state
    pub fn get(&self, handle: WindowHandle) -> Option<&WindowState> {
        self.windows.get(handle)
    }

    /// Iterate over every active window
    ///
    /// Order is implementation-defined but stable within one tick: the run
    /// loop visits each window exactly once per render pass.
    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (WindowHandle, &mut WindowState)> {
        self.windows.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> WindowRegistry {
        WindowRegistry::new(64)
    }

    #[test]
    fn active_set_tracks_creates_minus_deletes() {
        let mut reg = registry();
        let a = reg.create(SurfaceRef::new("a")).unwrap();
        let b = reg.create(SurfaceRef::new("b")).unwrap();
        let c = reg.create(SurfaceRef::new("c")).unwrap();
        assert_eq!(reg.len(), 3);

        reg.remove(b).unwrap();
        assert_eq!(reg.len(), 2);
        assert!(reg.contains(a));
        assert!(!reg.contains(b));
        assert!(reg.contains(c));
    }

    #[test]
    fn remove_unknown_handle_fails_loudly() {
        let mut reg = registry();
        let a = reg.create(SurfaceRef::new("a")).unwrap();
        reg.remove(a).unwrap();

        let err = reg.remove(a).unwrap_err();
        assert!(matches!(err, SessionError::InvalidHandle(_)));
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn double_delete_removes_exactly_one_entry() {
        let mut reg = registry();
        let a = reg.create(SurfaceRef::new("a")).unwrap();
        let _b = reg.create(SurfaceRef::new("b")).unwrap();

        assert!(reg.remove(a).is_ok());
        assert!(matches!(
            reg.remove(a),
            Err(SessionError::InvalidHandle(_))
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut reg = registry();
        let first = reg.create(SurfaceRef::new("a")).unwrap();
        reg.remove(first).unwrap();

        // The slot may be recycled but the versioned key must differ.
        let second = reg.create(SurfaceRef::new("a")).unwrap();
        assert_ne!(first, second);
        assert!(!reg.contains(first));
        assert!(reg.contains(second));
    }

    #[test]
    fn update_property_on_unknown_handle_changes_nothing() {
        let mut reg = registry();
        let a = reg.create(SurfaceRef::new("a")).unwrap();
        reg.update_property(PropertyTarget::Window(a), "red", PropertyValue::Int(5))
            .unwrap();

        let stale = reg.create(SurfaceRef::new("b")).unwrap();
        reg.remove(stale).unwrap();

        let err = reg
            .update_property(PropertyTarget::Window(stale), "red", PropertyValue::Int(9))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidHandle(_)));

        assert_eq!(reg.len(), 1);
        assert_eq!(
            reg.get(a).unwrap().properties().get("red"),
            Some(&PropertyValue::Int(5))
        );
    }

    #[test]
    fn broadcast_updates_every_window() {
        let mut reg = registry();
        let a = reg.create(SurfaceRef::new("a")).unwrap();
        let b = reg.create(SurfaceRef::new("b")).unwrap();

        reg.update_property(PropertyTarget::Broadcast, "dim", PropertyValue::Bool(true))
            .unwrap();

        for handle in [a, b] {
            assert_eq!(
                reg.get(handle).unwrap().properties().get("dim"),
                Some(&PropertyValue::Bool(true))
            );
        }
    }

    #[test]
    fn create_fails_at_capacity() {
        let mut reg = WindowRegistry::new(2);
        reg.create(SurfaceRef::new("a")).unwrap();
        reg.create(SurfaceRef::new("b")).unwrap();

        let err = reg.create(SurfaceRef::new("c")).unwrap_err();
        assert!(matches!(err, SessionError::ResourceExhausted(_)));
        assert_eq!(reg.len(), 2);

        // Removing one frees capacity again.
        let handles: Vec<_> = reg.iter_mut().map(|(h, _)| h).collect();
        reg.remove(handles[0]).unwrap();
        assert!(reg.create(SurfaceRef::new("c")).is_ok());
    }
}
