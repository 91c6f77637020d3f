//! Wires one graph context to the terminal: a worker owns the viewport
//! hosts, every surface follows their bridged streams, and key presses feed
//! local gesture streams bound into the worker.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use bpview_core::context::FIT_MARGIN;
use bpview_core::{GraphContext, PushChannel, SegmentId, Subscription};
use bpview_protocol::{CenterGesture, DragGesture, Point, Size, SpatialZoomGesture, ZoomGesture};
use bpview_render::{
    CanvasLoop, CanvasView, FrameScheduler, OverviewMap, PathView, SequenceTrack, SurfaceConsumer,
};
use bpview_rpc::TransportError;
use bpview_worker::{ViewportClient, WorkerHandle, spawn_worker};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Block,
};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::demo;
use crate::renderer::{FrameStore, Tui, paint};

const BIND_TIMEOUT: Duration = Duration::from_secs(5);
const KEY_HELP: &str =
    "←→ pan  +/- zoom  c center  n/p segment  r reset  wasd [] canvas  f fit  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Screen areas of the status line and each surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub status: Rect,
    pub overview: Rect,
    pub path: Rect,
    pub sequence: Rect,
    pub canvas: Rect,
}

impl Regions {
    pub fn split(area: Rect) -> Self {
        let [status, overview, path, sequence, canvas] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .areas(area);
        Self {
            status,
            overview,
            path,
            sequence,
            canvas,
        }
    }
}

fn size_of(area: Rect) -> Size {
    Size::new(f64::from(area.width), f64::from(area.height))
}

/// Consumer-local gesture streams. The worker's hosts subscribe to them
/// through the bridge; pushing here is the only way keys change the view.
struct Gestures {
    linear_zoom: PushChannel<ZoomGesture>,
    linear_drag: PushChannel<DragGesture>,
    linear_center: PushChannel<CenterGesture>,
    spatial_zoom: PushChannel<SpatialZoomGesture>,
    spatial_drag: PushChannel<DragGesture>,
}

impl Gestures {
    fn new() -> Self {
        Self {
            linear_zoom: PushChannel::multicast(),
            linear_drag: PushChannel::multicast(),
            linear_center: PushChannel::multicast(),
            spatial_zoom: PushChannel::multicast(),
            spatial_drag: PushChannel::multicast(),
        }
    }

    async fn bind(&self, client: &ViewportClient) -> Result<Vec<Subscription>, TransportError> {
        Ok(vec![
            client.bind_linear_zoom(Rc::new(self.linear_zoom.clone())).await?,
            client.bind_linear_drag(Rc::new(self.linear_drag.clone())).await?,
            client.bind_linear_center(Rc::new(self.linear_center.clone())).await?,
            client.bind_spatial_zoom(Rc::new(self.spatial_zoom.clone())).await?,
            client.bind_spatial_drag(Rc::new(self.spatial_drag.clone())).await?,
        ])
    }

    /// The worker subscribes to each bound stream asynchronously; a push
    /// before that lands nowhere.
    fn all_subscribed(&self) -> bool {
        self.linear_zoom.subscriber_count() > 0
            && self.linear_drag.subscriber_count() > 0
            && self.linear_center.subscriber_count() > 0
            && self.spatial_zoom.subscriber_count() > 0
            && self.spatial_drag.subscriber_count() > 0
    }
}

pub struct App {
    config: AppConfig,
    context: GraphContext,
    client: ViewportClient,
    store: Rc<FrameStore>,
    path: SurfaceConsumer<PathView>,
    overview: SurfaceConsumer<OverviewMap>,
    sequence: SurfaceConsumer<SequenceTrack>,
    canvas: Rc<CanvasLoop>,
    gestures: Gestures,
    bindings: Vec<Subscription>,
    tasks: Vec<JoinHandle<()>>,
    regions: Regions,
    segment_cursor: u32,
}

impl App {
    /// Attach every surface to the worker's streams and bind the gesture
    /// streams. Must run inside a `LocalSet`.
    pub async fn start(
        config: AppConfig,
        context: GraphContext,
        worker: &WorkerHandle,
        area: Rect,
    ) -> Result<Self> {
        let client = worker.client();
        let regions = Regions::split(area);
        let scheduler = FrameScheduler::new();
        let store = Rc::new(FrameStore::new());
        let render = &config.render;

        let linear = client
            .linear_stream()
            .await
            .context("subscribing to the linear view")?;
        let spatial = client
            .spatial_stream()
            .await
            .context("subscribing to the camera")?;

        let overview = SurfaceConsumer::attach(
            OverviewMap::new(context.coords().clone(), size_of(regions.overview)),
            linear.clone(),
            render.overview_throttle(),
            &scheduler,
            store.clone(),
        );
        let path = SurfaceConsumer::attach(
            PathView::new(context.coords().clone(), size_of(regions.path)),
            linear.clone(),
            render.path_throttle(),
            &scheduler,
            store.clone(),
        );
        let sequence = SurfaceConsumer::attach(
            SequenceTrack::new(context.sequence().cloned(), size_of(regions.sequence)),
            linear,
            render.sequence_throttle(),
            &scheduler,
            store.clone(),
        );
        let canvas = CanvasLoop::attach(
            CanvasView::new(context.layout().clone(), size_of(regions.canvas)),
            spatial,
            store.clone(),
        );

        let gestures = Gestures::new();
        let bindings = gestures
            .bind(&client)
            .await
            .context("binding gesture streams")?;
        timeout(BIND_TIMEOUT, async {
            while !gestures.all_subscribed() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .context("worker never subscribed to the gesture streams")?;
        let tasks = vec![
            scheduler.spawn(render.frame_interval()),
            canvas.spawn(render.canvas_frame()),
        ];
        info!(?regions, "surfaces attached");

        Ok(Self {
            config,
            context,
            client,
            store,
            path,
            overview,
            sequence,
            canvas,
            gestures,
            bindings,
            tasks,
            regions,
            segment_cursor: 0,
        })
    }

    pub fn resize(&mut self, area: Rect) {
        self.regions = Regions::split(area);
        self.overview.resize(size_of(self.regions.overview));
        self.path.resize(size_of(self.regions.path));
        self.sequence.resize(size_of(self.regions.sequence));
        self.canvas.resize(size_of(self.regions.canvas));
        self.store.mark_dirty();
        debug!(width = area.width, height = area.height, "resized");
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Control {
        let zoom = self.config.navigation.zoom_step;
        let pan = self.config.navigation.pan_step;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Left => self.gestures.linear_drag.push(DragGesture { dx: -pan, dy: 0.0 }),
            KeyCode::Right => self.gestures.linear_drag.push(DragGesture { dx: pan, dy: 0.0 }),
            KeyCode::Char('+') | KeyCode::Char('=') => self.gestures.linear_zoom.push(ZoomGesture {
                scale: 1.0 / zoom,
                anchor: 0.5,
            }),
            KeyCode::Char('-') => self.gestures.linear_zoom.push(ZoomGesture {
                scale: zoom,
                anchor: 0.5,
            }),
            KeyCode::Char('c') => self.gestures.linear_center.push(CenterGesture {
                bp: self.context.max_extent() / 2,
            }),
            KeyCode::Char('n') => self.step_segment(1),
            KeyCode::Char('p') => self.step_segment(-1),
            KeyCode::Char('r') => {
                let client = self.client.clone();
                spawn_call("linear.reset", async move { client.linear_reset().await.map(drop) });
            }
            KeyCode::Char('w') => {
                self.gestures.spatial_drag.push(DragGesture { dx: 0.0, dy: -pan })
            }
            KeyCode::Char('s') => self.gestures.spatial_drag.push(DragGesture { dx: 0.0, dy: pan }),
            KeyCode::Char('a') => {
                self.gestures.spatial_drag.push(DragGesture { dx: -pan, dy: 0.0 })
            }
            KeyCode::Char('d') => self.gestures.spatial_drag.push(DragGesture { dx: pan, dy: 0.0 }),
            KeyCode::Char(']') => self.gestures.spatial_zoom.push(SpatialZoomGesture {
                scale: 1.0 / zoom,
                anchor: Point::new(0.5, 0.5),
            }),
            KeyCode::Char('[') => self.gestures.spatial_zoom.push(SpatialZoomGesture {
                scale: zoom,
                anchor: Point::new(0.5, 0.5),
            }),
            KeyCode::Char('f') => {
                if let Some(bounds) = self.context.layout().bounds() {
                    let client = self.client.clone();
                    spawn_call("spatial.fit", async move {
                        client.spatial_fit(bounds, FIT_MARGIN).await.map(drop)
                    });
                }
            }
            _ => {}
        }
        Control::Continue
    }

    fn step_segment(&mut self, delta: i64) {
        let count = i64::from(self.config.demo.segments.max(1));
        let next = (i64::from(self.segment_cursor) + delta).rem_euclid(count);
        self.segment_cursor = u32::try_from(next).unwrap_or(0);
        let segment = SegmentId(self.segment_cursor);
        let client = self.client.clone();
        spawn_call("linear.centerOnSegment", async move {
            client.linear_center_on_segment(segment).await.map(drop)
        });
    }

    pub fn draw(&self, frame: &mut Frame) {
        let status = match self.path.latest() {
            Some(view) => format!(
                " bpview | {}..{} of {} bp | segment {} | {KEY_HELP} ",
                view.start, view.end, view.max, self.segment_cursor
            ),
            None => " bpview | waiting for the worker ".to_string(),
        };
        frame.render_widget(
            Block::default()
                .title(status)
                .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            self.regions.status,
        );

        let buf = frame.buffer_mut();
        for (surface, area) in [
            ("overview", self.regions.overview),
            ("path", self.regions.path),
            ("sequence", self.regions.sequence),
            ("canvas", self.regions.canvas),
        ] {
            self.store.with(surface, |commands| paint(buf, area, commands));
        }
    }

    /// Poll input and repaint once per frame interval until quit.
    pub async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.render.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.store.mark_dirty();
        loop {
            ticker.tick().await;
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key.code) == Control::Quit {
                            return Ok(());
                        }
                    }
                    Event::Resize(width, height) => self.resize(Rect::new(0, 0, width, height)),
                    _ => {}
                }
            }
            if self.store.take_dirty() {
                terminal.draw(|frame| self.draw(frame))?;
            }
        }
    }

    /// Cancel gesture bindings, detach every surface and stop the loops.
    pub fn detach(self) {
        for mut binding in self.bindings {
            binding.unsubscribe();
        }
        for task in self.tasks {
            task.abort();
        }
        self.canvas.detach();
        self.path.detach();
        self.overview.detach();
        self.sequence.detach();
    }
}

/// Fire a worker call without waiting on it. Teardown during shutdown is
/// expected and only logged at debug level.
fn spawn_call(
    method: &'static str,
    call: impl Future<Output = Result<(), TransportError>> + 'static,
) {
    tokio::task::spawn_local(async move {
        match call.await {
            Ok(()) => {}
            Err(err) if err.is_teardown() => debug!(method, %err, "call after teardown"),
            Err(err) => warn!(method, %err, "worker call failed"),
        }
    });
}

/// Join the worker on an error path; the original error wins.
fn stop_worker(worker: WorkerHandle) {
    if let Err(err) = worker.shutdown() {
        warn!(%err, "worker did not stop cleanly");
    }
}

/// Start the app against `worker`, or stop the worker when that fails.
async fn start_or_stop(
    config: AppConfig,
    context: GraphContext,
    worker: WorkerHandle,
    area: Rect,
) -> Result<(App, WorkerHandle)> {
    match App::start(config, context, &worker, area).await {
        Ok(app) => Ok((app, worker)),
        Err(err) => {
            stop_worker(worker);
            Err(err)
        }
    }
}

/// Build the demo graph, start its worker and run the UI until quit.
pub async fn run(config: AppConfig, terminal: &mut Tui) -> Result<()> {
    let context = demo::build(&config.demo);
    info!(?context, "demo graph built");
    let worker = spawn_worker(context.clone())
        .await
        .context("starting the viewport worker")?;

    let area = match terminal.size() {
        Ok(size) => Rect::new(0, 0, size.width, size.height),
        Err(err) => {
            stop_worker(worker);
            return Err(err.into());
        }
    };
    let (mut app, worker) = start_or_stop(config, context, worker, area).await?;
    let result = app.event_loop(terminal).await;
    app.detach();
    worker.shutdown().context("stopping the viewport worker")?;
    result
}

#[cfg(test)]
mod tests {
    use tokio::task::LocalSet;

    use super::*;
    use crate::config::DemoConfig;

    fn small_config() -> AppConfig {
        AppConfig {
            demo: DemoConfig {
                segments: 10,
                seed: 3,
                min_segment_bp: 100,
                max_segment_bp: 100,
                max_sequence_bp: 10_000,
            },
            ..AppConfig::default()
        }
    }

    async fn until(mut done: impl AsyncFnMut() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !done().await {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn regions_stack_top_to_bottom() {
        let regions = Regions::split(Rect::new(0, 0, 80, 30));
        assert_eq!(regions.status, Rect::new(0, 0, 80, 1));
        assert_eq!(regions.overview, Rect::new(0, 1, 80, 2));
        assert_eq!(regions.path, Rect::new(0, 3, 80, 6));
        assert_eq!(regions.sequence, Rect::new(0, 9, 80, 2));
        assert_eq!(regions.canvas, Rect::new(0, 11, 80, 19));
    }

    #[tokio::test]
    async fn failed_start_still_stops_the_worker() {
        LocalSet::new()
            .run_until(async {
                let config = small_config();
                let context = demo::build(&config.demo);
                let worker = spawn_worker(context.clone()).await.unwrap();
                worker.endpoint().close();

                let err = start_or_stop(config, context, worker, Rect::new(0, 0, 80, 30))
                    .await
                    .err()
                    .unwrap();
                assert!(format!("{err:#}").contains("subscribing to the linear view"));
            })
            .await;
    }

    #[tokio::test]
    async fn keys_reach_the_worker_and_surfaces_follow() {
        LocalSet::new()
            .run_until(async {
                let config = small_config();
                let context = demo::build(&config.demo);
                let worker = spawn_worker(context.clone()).await.unwrap();
                let client = worker.client();
                let mut app = App::start(config, context, &worker, Rect::new(0, 0, 80, 30))
                    .await
                    .unwrap();

                assert_eq!(app.handle_key(KeyCode::Char('+')), Control::Continue);
                until(async || client.linear_get().await.unwrap().len() == 800).await;
                until(async || app.path.latest().is_some_and(|v| v.len() == 800)).await;

                app.handle_key(KeyCode::Right);
                until(async || client.linear_get().await.unwrap().start == 180).await;

                // Segment 1 fits the 800 bp window, so it is centered and
                // the window shifts back against the lower edge.
                app.handle_key(KeyCode::Char('n'));
                until(async || client.linear_get().await.unwrap().start == 0).await;

                app.handle_key(KeyCode::Char('r'));
                until(async || client.linear_get().await.unwrap().len() == 1000).await;

                let before = client.spatial_get().await.unwrap();
                app.handle_key(KeyCode::Char('d'));
                until(async || {
                    client.spatial_get().await.unwrap().center.x > before.center.x
                })
                .await;
                until(async || {
                    app.canvas
                        .target()
                        .is_some_and(|c| c.center.x > before.center.x)
                })
                .await;

                assert_eq!(app.handle_key(KeyCode::Char('q')), Control::Quit);
                app.detach();
                worker.shutdown().unwrap();
            })
            .await;
    }
}
