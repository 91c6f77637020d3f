use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Point, Rect, Size};

/// A snapshot that failed validation on the receiving side.
///
/// Consumers drop these with a warning instead of drawing them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedSnapshot {
    #[error("range {start}..{end} is empty or inverted")]
    Inverted { start: i64, end: i64 },
    #[error("range {start}..{end} lies outside 0..{max}")]
    OutOfBounds { start: i64, end: i64, max: i64 },
    #[error("camera has a non-finite component")]
    NonFinite,
    #[error("camera size {w}x{h} is not positive")]
    NonPositiveSize { w: f64, h: f64 },
}

/// Receiving-side check every snapshot type implements.
pub trait Validate {
    fn validate(&self) -> Result<(), MalformedSnapshot>;
}

/// Immutable copy of a linear (base-pair) view at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearSnapshot {
    pub start: i64,
    pub end: i64,
    pub max: i64,
}

impl LinearSnapshot {
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    /// The visible window as fractions of the full extent, `[0, 1]`.
    pub fn fraction_range(&self) -> (f64, f64) {
        if self.max <= 0 {
            return (0.0, 1.0);
        }
        let max = self.max as f64;
        (self.start as f64 / max, self.end as f64 / max)
    }

    /// Base pair under a normalized horizontal position.
    pub fn bp_at(&self, norm_x: f64) -> f64 {
        self.start as f64 + norm_x * self.len() as f64
    }
}

impl Validate for LinearSnapshot {
    fn validate(&self) -> Result<(), MalformedSnapshot> {
        if self.end <= self.start {
            return Err(MalformedSnapshot::Inverted {
                start: self.start,
                end: self.end,
            });
        }
        if self.start < 0 || self.end > self.max {
            return Err(MalformedSnapshot::OutOfBounds {
                start: self.start,
                end: self.end,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Immutable copy of a 2D camera at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialSnapshot {
    pub center: Point,
    pub size: Size,
}

impl SpatialSnapshot {
    /// World point under the normalized viewport position `norm`
    /// (`(0, 0)` top-left, `(1, 1)` bottom-right).
    pub fn world_at(&self, norm: Point) -> Point {
        Point::new(
            self.center.x + (norm.x - 0.5) * self.size.w,
            self.center.y + (norm.y - 0.5) * self.size.h,
        )
    }

    /// Normalized viewport position of a world point. Inverse of [`Self::world_at`].
    pub fn norm_of(&self, world: Point) -> Point {
        Point::new(
            (world.x - self.center.x) / self.size.w + 0.5,
            (world.y - self.center.y) / self.size.h + 0.5,
        )
    }

    /// The visible world rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.size.w / 2.0,
            self.center.y - self.size.h / 2.0,
            self.size.w,
            self.size.h,
        )
    }
}

impl Validate for SpatialSnapshot {
    fn validate(&self) -> Result<(), MalformedSnapshot> {
        if !self.center.is_finite() || !self.size.w.is_finite() || !self.size.h.is_finite() {
            return Err(MalformedSnapshot::NonFinite);
        }
        if !self.size.is_valid() {
            return Err(MalformedSnapshot::NonPositiveSize {
                w: self.size.w,
                h: self.size.h,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_validation() {
        let ok = LinearSnapshot {
            start: 10,
            end: 20,
            max: 100,
        };
        assert!(ok.validate().is_ok());

        let inverted = LinearSnapshot {
            start: 20,
            end: 10,
            max: 100,
        };
        assert!(matches!(
            inverted.validate(),
            Err(MalformedSnapshot::Inverted { .. })
        ));

        let outside = LinearSnapshot {
            start: 90,
            end: 110,
            max: 100,
        };
        assert!(matches!(
            outside.validate(),
            Err(MalformedSnapshot::OutOfBounds { .. })
        ));
    }

    #[test]
    fn spatial_validation() {
        let bad = SpatialSnapshot {
            center: Point::new(f64::NAN, 0.0),
            size: Size::new(1.0, 1.0),
        };
        assert_eq!(bad.validate(), Err(MalformedSnapshot::NonFinite));

        let flat = SpatialSnapshot {
            center: Point::new(0.0, 0.0),
            size: Size::new(0.0, 1.0),
        };
        assert!(matches!(
            flat.validate(),
            Err(MalformedSnapshot::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn world_and_norm_are_inverse() {
        let cam = SpatialSnapshot {
            center: Point::new(10.0, -4.0),
            size: Size::new(50.0, 20.0),
        };
        let world = cam.world_at(Point::new(0.25, 0.8));
        let back = cam.norm_of(world);
        assert!((back.x - 0.25).abs() < 1e-12);
        assert!((back.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn fraction_range_of_full_window() {
        let snap = LinearSnapshot {
            start: 0,
            end: 400,
            max: 400,
        };
        assert_eq!(snap.fraction_range(), (0.0, 1.0));
    }
}
