use thiserror::Error;

/// Errors raised when a view model is constructed from invalid input.
///
/// Mutations never return these; they clamp or reject through
/// [`MutationOutcome`](crate::model::MutationOutcome) instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("coordinate system extent must be at least 1 bp, got {0}")]
    EmptyExtent(i64),
    #[error("range {start}..{end} violates 0 <= start < end <= {max}")]
    InvalidRange { start: i64, end: i64, max: i64 },
    #[error("camera at ({x}, {y}) with size {w}x{h} must be finite and positive")]
    InvalidCamera { x: f64, y: f64, w: f64, h: f64 },
}
