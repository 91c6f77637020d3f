use std::sync::Arc;

use bpview_core::CoordinateSystem;
use bpview_protocol::{LinearSnapshot, Point, Rect, RenderCommand, Size, ThemeToken};

use super::segment_runs;
use crate::consumer::Surface;

const HANDLE_WIDTH: f64 = 1.0;

/// The whole extent at once, with the visible window marked and two edge
/// handles for dragging it.
pub struct OverviewMap {
    coords: Arc<dyn CoordinateSystem>,
    area: Size,
}

impl OverviewMap {
    pub fn new(coords: Arc<dyn CoordinateSystem>, area: Size) -> Self {
        Self { coords, area }
    }
}

impl Surface for OverviewMap {
    type Snapshot = LinearSnapshot;

    fn name(&self) -> &'static str {
        "overview"
    }

    fn resize(&mut self, area: Size) {
        self.area = area;
    }

    fn render(&mut self, snapshot: &LinearSnapshot) -> Vec<RenderCommand> {
        let Size { w: width, h: height } = self.area;
        if width <= 0.0 || height <= 0.0 {
            return Vec::new();
        }
        let runs = segment_runs(
            self.coords.as_ref(),
            0,
            self.coords.max_extent(),
            width.floor() as usize,
        );

        let mut commands = Vec::with_capacity(runs.len() + 10);
        commands.push(RenderCommand::BeginGroup {
            id: "overview".into(),
            label: Some("Overview".into()),
        });
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, width, height),
            color: ThemeToken::OverviewBackground,
            border_color: None,
            label: None,
            segment: None,
        });
        for run in runs {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(run.first_col as f64, 0.0, run.cols as f64, height),
                color: ThemeToken::for_segment(run.segment.0),
                border_color: None,
                label: None,
                segment: Some(run.segment.0),
            });
        }

        let (start_frac, end_frac) = snapshot.fraction_range();
        let vp_x = start_frac * width;
        let vp_w = ((end_frac - start_frac) * width).max(HANDLE_WIDTH);

        // Dim what lies outside the window.
        if vp_x > 0.0 {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(0.0, 0.0, vp_x, height),
                color: ThemeToken::OverviewBackground,
                border_color: None,
                label: None,
                segment: None,
            });
        }
        let right_x = vp_x + vp_w;
        if right_x < width {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(right_x, 0.0, width - right_x, height),
                color: ThemeToken::OverviewBackground,
                border_color: None,
                label: None,
                segment: None,
            });
        }

        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(vp_x, 0.0, vp_w, height),
            color: ThemeToken::OverviewViewport,
            border_color: Some(ThemeToken::OverviewHandle),
            label: None,
            segment: None,
        });
        for x in [vp_x, right_x] {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, 0.0),
                to: Point::new(x, height),
                color: ThemeToken::OverviewHandle,
                width: HANDLE_WIDTH,
            });
        }

        commands.push(RenderCommand::EndGroup);
        commands
    }
}
