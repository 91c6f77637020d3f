//! Render-command surfaces.
//!
//! Coordinates are in surface units with the origin at the top-left; the
//! terminal renderer maps one unit to one cell.

pub mod canvas;
pub mod overview;
pub mod path;
pub mod ruler;
pub mod sequence;

use bpview_core::{CoordinateSystem, SegmentId};

pub use canvas::{CanvasLoop, CanvasView};
pub use overview::OverviewMap;
pub use path::PathView;
pub use sequence::SequenceTrack;

/// A horizontal stretch of columns showing the same segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentRun {
    pub first_col: usize,
    pub cols: usize,
    pub segment: SegmentId,
}

/// Bucket `[start, end)` into `cols` columns, pick the segment under each
/// column's center and merge neighbouring columns showing the same segment.
///
/// Work is bounded by the column count, not the number of segments.
pub(crate) fn segment_runs(
    coords: &dyn CoordinateSystem,
    start: i64,
    end: i64,
    cols: usize,
) -> Vec<SegmentRun> {
    if cols == 0 || end <= start {
        return Vec::new();
    }
    let bp_per_col = (end - start) as f64 / cols as f64;
    let mut runs: Vec<SegmentRun> = Vec::new();
    for col in 0..cols {
        let bp = start + ((col as f64 + 0.5) * bp_per_col) as i64;
        let Some(segment) = coords.segment_at_position(bp.min(end - 1)) else {
            continue;
        };
        match runs.last_mut() {
            Some(run) if run.segment == segment && run.first_col + run.cols == col => run.cols += 1,
            _ => runs.push(SegmentRun {
                first_col: col,
                cols: 1,
                segment,
            }),
        }
    }
    runs
}
