use bpview_protocol::LinearSnapshot;

use super::{MutationOutcome, RejectReason, ViewModel};
use crate::error::ViewError;

/// A one-dimensional window `[start, end)` over `0..max` base pairs.
///
/// Invariant: `0 <= start < end <= max`. `max` is fixed at construction;
/// every mutation either keeps the invariant or is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearView {
    start: i64,
    end: i64,
    max: i64,
}

impl LinearView {
    /// A view showing the full extent `0..max`.
    pub fn new(max: i64) -> Result<Self, ViewError> {
        if max < 1 {
            return Err(ViewError::EmptyExtent(max));
        }
        Ok(Self { start: 0, end: max, max })
    }

    pub fn with_range(start: i64, end: i64, max: i64) -> Result<Self, ViewError> {
        let mut view = Self::new(max)?;
        if start < 0 || end <= start || end > max {
            return Err(ViewError::InvalidRange { start, end, max });
        }
        view.start = start;
        view.end = end;
        Ok(view)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    /// Move to `[start, end)`, shifting the window back inside `0..max`.
    ///
    /// The requested length survives whenever it fits; otherwise the window
    /// becomes the full extent.
    pub fn set(&mut self, start: i64, end: i64) -> MutationOutcome {
        if end <= start {
            return MutationOutcome::Rejected(RejectReason::EmptyRange);
        }
        let (mut s, mut e) = (start, end);
        if s < 0 {
            e = e.saturating_sub(s);
            s = 0;
        }
        if e > self.max {
            s = s.saturating_sub(e - self.max);
            e = self.max;
        }
        let s = s.max(0);
        self.apply((start, end), (s, e))
    }

    /// Shift the window by `delta` base pairs, keeping its length.
    pub fn translate(&mut self, delta: i64) -> MutationOutcome {
        let len = self.len();
        let Some(new_start) = self.start.checked_add(delta) else {
            return MutationOutcome::Rejected(RejectReason::Overflow);
        };
        let Some(new_end) = new_start.checked_add(len) else {
            return MutationOutcome::Rejected(RejectReason::Overflow);
        };
        let target = if new_start < 0 {
            (0, len)
        } else if new_end > self.max {
            // Pinned one unit short of the upper edge.
            let s = (self.max - len - 1).max(0);
            (s, (s + len).min(self.max))
        } else {
            (new_start, new_end)
        };
        self.apply((new_start, new_end), target)
    }

    /// Pan by a signed fraction of the visible length.
    pub fn pan(&mut self, fraction: f64) -> MutationOutcome {
        let delta = fraction * self.len() as f64;
        if !delta.is_finite() {
            return MutationOutcome::Rejected(RejectReason::NonFinite);
        }
        self.translate(delta.round() as i64)
    }

    /// Scale the visible length by `scale`, keeping the base pair under
    /// `norm_x` fixed. `scale > 1` zooms out.
    pub fn zoom_with_focus(&mut self, norm_x: f64, scale: f64) -> MutationOutcome {
        if !norm_x.is_finite() || !scale.is_finite() {
            return MutationOutcome::Rejected(RejectReason::NonFinite);
        }
        if scale <= 0.0 {
            return MutationOutcome::Rejected(RejectReason::NonPositive);
        }
        let norm_x = norm_x.clamp(0.0, 1.0);
        let len = self.len() as f64;
        let focus = self.start as f64 + norm_x * len;
        let new_len = (len * scale).clamp(1.0, self.max as f64).round();
        let new_start = (focus - norm_x * new_len).round() as i64;
        self.set(new_start, new_start.saturating_add(new_len as i64))
    }

    /// Center the window on `bp`, keeping its length.
    pub fn center_at(&mut self, bp: i64) -> MutationOutcome {
        let len = self.len();
        let start = bp.saturating_sub(len / 2);
        self.set(start, start.saturating_add(len))
    }

    /// Show the full extent.
    pub fn reset(&mut self) -> MutationOutcome {
        self.set(0, self.max)
    }

    fn apply(&mut self, requested: (i64, i64), target: (i64, i64)) -> MutationOutcome {
        debug_assert!(0 <= target.0 && target.0 < target.1 && target.1 <= self.max);
        self.start = target.0;
        self.end = target.1;
        if requested == target {
            MutationOutcome::Applied
        } else {
            MutationOutcome::Clamped
        }
    }
}

impl ViewModel for LinearView {
    type Snapshot = LinearSnapshot;

    fn snapshot(&self) -> LinearSnapshot {
        LinearSnapshot {
            start: self.start,
            end: self.end,
            max: self.max,
        }
    }
}
