//! Wires a snapshot stream to a surface.
//!
//! The pipeline for every attached surface is
//! validate → distinct → throttle → schedule → render → present.
//! Malformed snapshots are logged and dropped before they reach a surface.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use bpview_core::stream::observer_fn;
use bpview_core::{Observable, Subscription};
use bpview_protocol::{RenderCommand, Size, Validate};
use tracing::{debug, warn};

use crate::operators::{distinct_until_changed, filter, throttle_latest};
use crate::scheduler::{FrameKey, FrameScheduler};
use crate::sink::RenderSink;

/// Something that turns one kind of snapshot into render commands.
pub trait Surface {
    type Snapshot: Clone + PartialEq + Validate + 'static;

    fn name(&self) -> &'static str;

    /// The drawable area changed; the next render uses it.
    fn resize(&mut self, area: Size);

    fn render(&mut self, snapshot: &Self::Snapshot) -> Vec<RenderCommand>;
}

/// Drop snapshots that fail validation, with a warning naming `surface`.
pub fn validated<T>(source: Rc<dyn Observable<T>>, surface: &'static str) -> Rc<dyn Observable<T>>
where
    T: Validate + std::fmt::Debug + 'static,
{
    filter(source, move |snapshot: &T| match snapshot.validate() {
        Ok(()) => true,
        Err(err) => {
            warn!(surface, %err, ?snapshot, "dropping malformed snapshot");
            false
        }
    })
}

/// A surface attached to a snapshot stream.
pub struct SurfaceConsumer<S: Surface> {
    surface: Rc<RefCell<S>>,
    latest: Rc<RefCell<Option<S::Snapshot>>>,
    subscription: Subscription,
    scheduler: FrameScheduler,
    frame: FrameKey,
}

impl<S> SurfaceConsumer<S>
where
    S: Surface + 'static,
    S::Snapshot: std::fmt::Debug,
{
    pub fn attach(
        surface: S,
        source: Rc<dyn Observable<S::Snapshot>>,
        throttle: Duration,
        scheduler: &FrameScheduler,
        sink: Rc<dyn RenderSink>,
    ) -> Self {
        let name = surface.name();
        let surface = Rc::new(RefCell::new(surface));
        let latest: Rc<RefCell<Option<S::Snapshot>>> = Rc::new(RefCell::new(None));

        let frame = scheduler.register({
            let surface = surface.clone();
            let latest = latest.clone();
            move || {
                let snapshot = latest.borrow().clone();
                if let Some(snapshot) = snapshot {
                    let commands = surface.borrow_mut().render(&snapshot);
                    sink.present(name, commands);
                }
            }
        });

        let stream = throttle_latest(
            distinct_until_changed(validated(source, name)),
            throttle,
        );
        let subscription = stream.subscribe(observer_fn({
            let latest = latest.clone();
            let scheduler = scheduler.clone();
            move |snapshot| {
                *latest.borrow_mut() = Some(snapshot);
                scheduler.request(frame);
            }
        }));
        debug!(surface = name, ?throttle, "surface attached");

        Self {
            surface,
            latest,
            subscription,
            scheduler: scheduler.clone(),
            frame,
        }
    }

    pub fn name(&self) -> &'static str {
        self.surface.borrow().name()
    }

    /// The snapshot the next frame will draw.
    pub fn latest(&self) -> Option<S::Snapshot> {
        self.latest.borrow().clone()
    }

    /// Resize the surface and redraw it on the next frame.
    pub fn resize(&self, area: Size) {
        self.surface.borrow_mut().resize(area);
        self.scheduler.request(self.frame);
    }

    pub fn detach(mut self) {
        self.subscription.unsubscribe();
        self.scheduler.unregister(self.frame);
        debug!(surface = self.name(), "surface detached");
    }
}
