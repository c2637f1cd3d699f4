//! Surface references and extents
//!
//! A surface reference names a drawable target owned by the embedding layer
//! (a canvas element, a native view, an offscreen buffer). The core never
//! interprets it; only the render backend resolves it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied identifier for a drawable target, opaque to the core
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceRef(String);

impl SurfaceRef {
    /// Create a surface reference from an embedding-layer identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as given by the embedding layer
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Drawable dimensions reported by the render backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceExtent {
    /// Width in physical pixels
    pub width: u32,
    /// Height in physical pixels
    pub height: u32,
}

impl SurfaceExtent {
    /// Create an extent from pixel dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for SurfaceExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
