//! Pre-normalized gesture values.
//!
//! Surfaces turn raw pointer, wheel and key events into these and push them
//! into a local gesture stream; the viewport host applies them.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Zoom around a horizontal anchor of a linear view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomGesture {
    /// Multiplier on the visible length; `> 1` zooms out.
    pub scale: f64,
    /// Anchor as a fraction of the surface width, `[0, 1]`.
    pub anchor: f64,
}

/// Zoom around a point of a 2D camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialZoomGesture {
    pub scale: f64,
    /// Anchor in normalized viewport coordinates, `[0, 1]²`.
    pub anchor: Point,
}

/// Pan by signed deltas expressed in multiples of the visible extent.
///
/// Linear views only read `dx`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragGesture {
    pub dx: f64,
    pub dy: f64,
}

/// Center the linear view on an absolute base-pair position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterGesture {
    pub bp: i64,
}
