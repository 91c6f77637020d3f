use std::sync::Arc;

use bpview_core::CoordinateSystem;
use bpview_protocol::{LinearSnapshot, Rect, RenderCommand, Size, ThemeToken};

use super::ruler::{RULER_HEIGHT, render_ruler};
use super::segment_runs;
use crate::consumer::Surface;

const TRACK_HEIGHT: f64 = 3.0;
/// Runs narrower than this stay unlabelled.
const MIN_LABEL_COLS: usize = 6;

/// Path viewer: the segments under the visible range, above a bp ruler.
pub struct PathView {
    coords: Arc<dyn CoordinateSystem>,
    area: Size,
}

impl PathView {
    pub fn new(coords: Arc<dyn CoordinateSystem>, area: Size) -> Self {
        Self { coords, area }
    }
}

impl Surface for PathView {
    type Snapshot = LinearSnapshot;

    fn name(&self) -> &'static str {
        "path"
    }

    fn resize(&mut self, area: Size) {
        self.area = area;
    }

    fn render(&mut self, snapshot: &LinearSnapshot) -> Vec<RenderCommand> {
        let width = self.area.w.max(0.0);
        let cols = width.floor() as usize;
        let runs = segment_runs(self.coords.as_ref(), snapshot.start, snapshot.end, cols);

        let mut commands = Vec::with_capacity(runs.len() + 32);
        commands.push(RenderCommand::BeginGroup {
            id: "path".into(),
            label: Some(format!("{}..{}", snapshot.start, snapshot.end)),
        });
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, width, self.area.h),
            color: ThemeToken::TrackBackground,
            border_color: None,
            label: None,
            segment: None,
        });
        commands.extend(render_ruler(
            width,
            snapshot.start as f64,
            snapshot.end as f64,
        ));

        let track_h = TRACK_HEIGHT.min((self.area.h - RULER_HEIGHT).max(0.0));
        if track_h > 0.0 {
            for run in runs {
                let label = (run.cols >= MIN_LABEL_COLS).then(|| format!("s{}", run.segment.0));
                commands.push(RenderCommand::DrawRect {
                    rect: Rect::new(run.first_col as f64, RULER_HEIGHT, run.cols as f64, track_h),
                    color: ThemeToken::for_segment(run.segment.0),
                    border_color: None,
                    label,
                    segment: Some(run.segment.0),
                });
            }
        }

        commands.push(RenderCommand::EndGroup);
        commands
    }
}

#[cfg(test)]
mod tests {
    use bpview_core::SegmentTable;

    use super::*;

    fn segment_rects(commands: &[RenderCommand]) -> Vec<(u32, f64, f64, Option<String>)> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    segment: Some(id),
                    label,
                    ..
                } => Some((*id, rect.x, rect.w, label.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn draws_visible_segments_in_order() {
        let coords = Arc::new(SegmentTable::from_lengths([500, 300, 200]));
        let mut view = PathView::new(coords, Size::new(100.0, 6.0));
        let cmds = view.render(&LinearSnapshot {
            start: 0,
            end: 1000,
            max: 1000,
        });

        assert!(matches!(cmds.first(), Some(RenderCommand::BeginGroup { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));
        let rects = segment_rects(&cmds);
        assert_eq!(
            rects,
            vec![
                (0, 0.0, 50.0, Some("s0".into())),
                (1, 50.0, 30.0, Some("s1".into())),
                (2, 80.0, 20.0, Some("s2".into())),
            ]
        );
    }

    #[test]
    fn zoomed_window_shows_one_segment_after_resize() {
        let coords = Arc::new(SegmentTable::from_lengths([500, 300, 200]));
        let mut view = PathView::new(coords, Size::new(100.0, 6.0));
        view.resize(Size::new(4.0, 6.0));
        let rects = segment_rects(&view.render(&LinearSnapshot {
            start: 600,
            end: 700,
            max: 1000,
        }));
        assert_eq!(rects, vec![(1, 0.0, 4.0, None)]);
    }

    #[test]
    fn too_short_area_skips_the_track() {
        let coords = Arc::new(SegmentTable::from_lengths([10]));
        let mut view = PathView::new(coords, Size::new(10.0, RULER_HEIGHT));
        let cmds = view.render(&LinearSnapshot {
            start: 0,
            end: 10,
            max: 10,
        });
        assert!(segment_rects(&cmds).is_empty());
    }
}
