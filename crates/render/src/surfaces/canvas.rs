//! The 2D layout canvas and its own frame loop.
//!
//! Unlike the other surfaces the canvas is not throttled: it records the
//! newest camera as a target and a fixed-rate loop redraws only when the
//! drawn camera differs from it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use bpview_core::stream::observer_fn;
use bpview_core::{Observable, PointSequence, Subscription};
use bpview_protocol::{Point, Rect, RenderCommand, Size, SpatialSnapshot, ThemeToken};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::consumer::{Surface, validated};
use crate::sink::RenderSink;

const NODE_SIZE: f64 = 1.0;

pub struct CanvasView {
    layout: Arc<PointSequence>,
    area: Size,
}

impl CanvasView {
    pub fn new(layout: Arc<PointSequence>, area: Size) -> Self {
        Self { layout, area }
    }

    fn to_screen(&self, camera: &SpatialSnapshot, world: Point) -> Point {
        let norm = camera.norm_of(world);
        Point::new(norm.x * self.area.w, norm.y * self.area.h)
    }

    fn on_screen(&self, p: Point) -> bool {
        p.is_finite() && (0.0..self.area.w).contains(&p.x) && (0.0..self.area.h).contains(&p.y)
    }
}

impl Surface for CanvasView {
    type Snapshot = SpatialSnapshot;

    fn name(&self) -> &'static str {
        "canvas"
    }

    fn resize(&mut self, area: Size) {
        self.area = area;
    }

    fn render(&mut self, camera: &SpatialSnapshot) -> Vec<RenderCommand> {
        let mut commands = Vec::with_capacity(self.layout.len() * 2 + 3);
        commands.push(RenderCommand::BeginGroup {
            id: "canvas".into(),
            label: None,
        });
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, self.area.w, self.area.h),
            color: ThemeToken::CanvasBackground,
            border_color: None,
            label: None,
            segment: None,
        });

        let screen: Vec<Point> = self
            .layout
            .iter()
            .map(|p| self.to_screen(camera, *p))
            .collect();

        // Edges join consecutive layout points; skip those with both ends off screen.
        for pair in screen.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if !a.is_finite() || !b.is_finite() || (!self.on_screen(a) && !self.on_screen(b)) {
                continue;
            }
            commands.push(RenderCommand::DrawLine {
                from: a,
                to: b,
                color: ThemeToken::CanvasEdge,
                width: 1.0,
            });
        }
        for (index, p) in screen.iter().enumerate() {
            if !self.on_screen(*p) {
                continue;
            }
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(p.x - NODE_SIZE / 2.0, p.y - NODE_SIZE / 2.0, NODE_SIZE, NODE_SIZE),
                color: ThemeToken::CanvasNode,
                border_color: None,
                label: None,
                segment: u32::try_from(index).ok(),
            });
        }

        commands.push(RenderCommand::EndGroup);
        commands
    }
}

struct LoopState {
    view: CanvasView,
    target: Option<SpatialSnapshot>,
    current: Option<SpatialSnapshot>,
    redraws: u64,
}

/// Continuously running canvas: each tick compares the drawn camera with
/// the latest received one and redraws on divergence.
pub struct CanvasLoop {
    state: Rc<RefCell<LoopState>>,
    sink: Rc<dyn RenderSink>,
    subscription: RefCell<Subscription>,
}

impl CanvasLoop {
    pub fn attach(
        view: CanvasView,
        source: Rc<dyn Observable<SpatialSnapshot>>,
        sink: Rc<dyn RenderSink>,
    ) -> Rc<Self> {
        let state = Rc::new(RefCell::new(LoopState {
            view,
            target: None,
            current: None,
            redraws: 0,
        }));
        let subscription = validated(source, "canvas").subscribe(observer_fn({
            let state = state.clone();
            move |camera| state.borrow_mut().target = Some(camera)
        }));
        debug!(surface = "canvas", "canvas loop attached");
        Rc::new(Self {
            state,
            sink,
            subscription: RefCell::new(subscription),
        })
    }

    /// Redraw if the target camera moved since the last draw. Returns whether
    /// a frame was presented.
    pub fn tick(&self) -> bool {
        let commands = {
            let mut state = self.state.borrow_mut();
            let Some(target) = state.target else {
                return false;
            };
            if state.current == Some(target) {
                return false;
            }
            state.current = Some(target);
            state.redraws += 1;
            state.view.render(&target)
        };
        self.sink.present("canvas", commands);
        true
    }

    pub fn redraws(&self) -> u64 {
        self.state.borrow().redraws
    }

    pub fn target(&self) -> Option<SpatialSnapshot> {
        self.state.borrow().target
    }

    /// Resize and force a redraw on the next tick.
    pub fn resize(&self, area: Size) {
        let mut state = self.state.borrow_mut();
        state.view.resize(area);
        state.current = None;
    }

    /// Tick every `interval` on the current `LocalSet` until aborted.
    pub fn spawn(self: &Rc<Self>, interval: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                this.tick();
            }
        })
    }

    /// Stop following the camera. The spawned loop, if any, keeps running
    /// until aborted but has nothing new to draw.
    pub fn detach(&self) {
        self.subscription.borrow_mut().unsubscribe();
        debug!(surface = "canvas", "canvas loop detached");
    }
}

#[cfg(test)]
mod tests {
    use bpview_core::PushChannel;

    use super::*;
    use crate::sink::RecordingSink;

    fn camera(x: f64) -> SpatialSnapshot {
        SpatialSnapshot {
            center: Point::new(x, 0.0),
            size: Size::new(10.0, 10.0),
        }
    }

    #[test]
    fn view_maps_world_to_cells() {
        let layout = Arc::new(PointSequence::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.5, 2.5),
            Point::new(100.0, 100.0),
        ]));
        let mut view = CanvasView::new(layout, Size::new(20.0, 20.0));
        let cmds = view.render(&camera(0.0));

        let nodes: Vec<(Rect, Option<u32>)> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    color: ThemeToken::CanvasNode,
                    segment,
                    ..
                } => Some((*rect, *segment)),
                _ => None,
            })
            .collect();
        assert_eq!(
            nodes,
            vec![
                (Rect::new(9.5, 9.5, 1.0, 1.0), Some(0)),
                (Rect::new(14.5, 14.5, 1.0, 1.0), Some(1)),
            ]
        );
        let edges = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawLine { .. }))
            .count();
        assert_eq!(edges, 2);
    }

    #[test]
    fn loop_redraws_only_on_divergence() {
        let layout = Arc::new(PointSequence::new(vec![Point::new(0.0, 0.0)]));
        let channel = PushChannel::replay_latest(camera(0.0));
        let sink = Rc::new(RecordingSink::new());
        let canvas = CanvasLoop::attach(
            CanvasView::new(layout, Size::new(20.0, 20.0)),
            Rc::new(channel.clone()),
            sink.clone(),
        );

        assert!(canvas.tick());
        assert!(!canvas.tick());
        channel.push(camera(0.0));
        assert!(!canvas.tick());
        channel.push(camera(1.0));
        channel.push(camera(2.0));
        assert!(canvas.tick());
        assert_eq!(canvas.redraws(), 2);
        assert_eq!(sink.count("canvas"), 2);

        canvas.resize(Size::new(30.0, 30.0));
        assert!(canvas.tick());

        canvas.detach();
        channel.push(camera(5.0));
        assert!(!canvas.tick());
        assert_eq!(canvas.target(), Some(camera(2.0)));
    }

    #[test]
    fn malformed_camera_never_becomes_the_target() {
        let layout = Arc::new(PointSequence::default());
        let channel = PushChannel::replay_latest(camera(0.0));
        let sink = Rc::new(RecordingSink::new());
        let canvas = CanvasLoop::attach(
            CanvasView::new(layout, Size::new(5.0, 5.0)),
            Rc::new(channel.clone()),
            sink,
        );
        channel.push(SpatialSnapshot {
            center: Point::new(f64::INFINITY, 0.0),
            size: Size::new(1.0, 1.0),
        });
        assert_eq!(canvas.target(), Some(camera(0.0)));
    }
}
