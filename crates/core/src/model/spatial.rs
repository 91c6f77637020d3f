use bpview_protocol::{Point, Rect, Size, SpatialSnapshot};

use super::{MutationOutcome, RejectReason, ViewModel};
use crate::error::ViewError;

/// A 2D camera: the world rectangle of `size` centered on `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialView {
    center: Point,
    size: Size,
}

impl SpatialView {
    pub fn new(center: Point, size: Size) -> Result<Self, ViewError> {
        if !center.is_finite() || !size.is_valid() {
            return Err(ViewError::InvalidCamera {
                x: center.x,
                y: center.y,
                w: size.w,
                h: size.h,
            });
        }
        Ok(Self { center, size })
    }

    /// A camera framing `bounds` with `margin` (a fraction of each side) to spare.
    pub fn fitted(bounds: Rect, margin: f64) -> Result<Self, ViewError> {
        let (center, size) = fit_camera(bounds, margin);
        Self::new(center, size)
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_center(&mut self, x: f64, y: f64) -> MutationOutcome {
        let center = Point::new(x, y);
        if !center.is_finite() {
            return MutationOutcome::Rejected(RejectReason::NonFinite);
        }
        self.center = center;
        MutationOutcome::Applied
    }

    /// Move the center by `dx`/`dy` multiples of the visible size.
    pub fn translate_rel(&mut self, dx: f64, dy: f64) -> MutationOutcome {
        self.set_center(
            self.center.x + dx * self.size.w,
            self.center.y + dy * self.size.h,
        )
    }

    /// Scale the visible size by `scale` while the world point under the
    /// normalized viewport position `(tx, ty)` stays under it.
    pub fn zoom_with_focus(&mut self, tx: f64, ty: f64, scale: f64) -> MutationOutcome {
        if !tx.is_finite() || !ty.is_finite() || !scale.is_finite() {
            return MutationOutcome::Rejected(RejectReason::NonFinite);
        }
        if scale <= 0.0 {
            return MutationOutcome::Rejected(RejectReason::NonPositive);
        }
        let anchor = Point::new(tx.clamp(0.0, 1.0), ty.clamp(0.0, 1.0));
        let world = self.snapshot().world_at(anchor);
        let size = Size::new(self.size.w * scale, self.size.h * scale);
        if !size.is_valid() {
            return MutationOutcome::Rejected(RejectReason::NonPositive);
        }
        let center = Point::new(
            world.x - (anchor.x - 0.5) * size.w,
            world.y - (anchor.y - 0.5) * size.h,
        );
        if !center.is_finite() {
            return MutationOutcome::Rejected(RejectReason::NonFinite);
        }
        self.center = center;
        self.size = size;
        MutationOutcome::Applied
    }

    /// Frame `bounds` with `margin` to spare.
    pub fn fit(&mut self, bounds: Rect, margin: f64) -> MutationOutcome {
        let (center, size) = fit_camera(bounds, margin);
        if !center.is_finite() {
            return MutationOutcome::Rejected(RejectReason::NonFinite);
        }
        if !size.is_valid() {
            return MutationOutcome::Rejected(RejectReason::NonPositive);
        }
        self.center = center;
        self.size = size;
        MutationOutcome::Applied
    }
}

fn fit_camera(bounds: Rect, margin: f64) -> (Point, Size) {
    // Degenerate layouts (a single point, a straight line) still get a camera.
    let w = if bounds.w > 0.0 { bounds.w } else { 1.0 };
    let h = if bounds.h > 0.0 { bounds.h } else { 1.0 };
    let grow = 1.0 + margin.max(0.0);
    (bounds.center(), Size::new(w * grow, h * grow))
}

impl ViewModel for SpatialView {
    type Snapshot = SpatialSnapshot;

    fn snapshot(&self) -> SpatialSnapshot {
        SpatialSnapshot {
            center: self.center,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn camera(x: f64, y: f64, w: f64, h: f64) -> SpatialView {
        SpatialView::new(Point::new(x, y), Size::new(w, h)).expect("valid camera")
    }

    #[test]
    fn zoom_at_center_scales_size_only() {
        let mut cam = camera(0.0, 0.0, 100.0, 100.0);
        assert_eq!(cam.zoom_with_focus(0.5, 0.5, 2.0), MutationOutcome::Applied);
        assert_eq!(cam.center(), Point::new(0.0, 0.0));
        assert_eq!(cam.size(), Size::new(200.0, 200.0));
    }

    #[test]
    fn zoom_at_corner_moves_center() {
        let mut cam = camera(0.0, 0.0, 100.0, 100.0);
        cam.zoom_with_focus(0.0, 0.0, 0.5);
        // Top-left world point (-50, -50) stays at the top-left corner.
        assert_eq!(cam.center(), Point::new(-25.0, -25.0));
        assert_eq!(cam.size(), Size::new(50.0, 50.0));
    }

    #[test]
    fn translate_is_relative_to_size() {
        let mut cam = camera(10.0, 10.0, 40.0, 20.0);
        cam.translate_rel(0.5, -1.0);
        assert_eq!(cam.center(), Point::new(30.0, -10.0));
    }

    #[test]
    fn bad_input_keeps_prior_state() {
        let mut cam = camera(1.0, 2.0, 3.0, 4.0);
        let before = cam.clone();
        assert!(cam.set_center(f64::NAN, 0.0).is_rejected());
        assert!(cam.zoom_with_focus(0.5, 0.5, -1.0).is_rejected());
        assert!(cam.zoom_with_focus(0.5, 0.5, f64::INFINITY).is_rejected());
        assert!(cam.translate_rel(f64::MAX, 0.0).is_rejected());
        assert_eq!(cam, before);
    }

    #[test]
    fn fit_handles_degenerate_bounds() {
        let cam = SpatialView::fitted(Rect::new(5.0, 5.0, 0.0, 0.0), 0.0).unwrap();
        assert_eq!(cam.center(), Point::new(5.0, 5.0));
        assert_eq!(cam.size(), Size::new(1.0, 1.0));

        let cam = SpatialView::fitted(Rect::new(0.0, 0.0, 100.0, 50.0), 0.1).unwrap();
        assert_eq!(cam.center(), Point::new(50.0, 25.0));
        assert!((cam.size().w - 110.0).abs() < 1e-9);
        assert!((cam.size().h - 55.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn zoom_keeps_world_point_under_cursor(
            cx in -1e4f64..1e4,
            cy in -1e4f64..1e4,
            w in 1.0f64..1e4,
            h in 1.0f64..1e4,
            tx in 0.0f64..=1.0,
            ty in 0.0f64..=1.0,
            scale in 0.05f64..20.0,
        ) {
            let mut cam = camera(cx, cy, w, h);
            let anchor = Point::new(tx, ty);
            let before = cam.snapshot().world_at(anchor);
            prop_assert_eq!(cam.zoom_with_focus(tx, ty, scale), MutationOutcome::Applied);
            let after = cam.snapshot().world_at(anchor);
            let tol = 1e-6 * (1.0 + before.x.abs().max(before.y.abs()));
            prop_assert!((before.x - after.x).abs() < tol);
            prop_assert!((before.y - after.y).abs() < tol);
        }
    }
}
