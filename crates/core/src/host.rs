//! The single writer of a view model.
//!
//! A [`ViewportHost`] owns one view, applies every mutation to it, and pushes
//! a fresh snapshot through its replay-latest channel after each one. Gesture
//! streams are bound to it with the `subscribe_*` helpers so every surface
//! funnels through the same operations.

use std::cell::RefCell;
use std::rc::Rc;

use bpview_protocol::{CenterGesture, DragGesture, Rect, SpatialZoomGesture, ZoomGesture};
use tracing::{debug, trace};

use crate::coords::{CoordinateSystem, SegmentId};
use crate::model::{LinearView, MutationOutcome, SpatialView, ViewModel};
use crate::stream::{Observable, PushChannel, Subscription, observer_fn};

pub struct ViewportHost<V: ViewModel> {
    view: Rc<RefCell<V>>,
    channel: PushChannel<V::Snapshot>,
    name: &'static str,
}

impl<V: ViewModel + 'static> ViewportHost<V> {
    pub fn new(name: &'static str, view: V) -> Self {
        let channel = PushChannel::replay_latest(view.snapshot());
        Self {
            view: Rc::new(RefCell::new(view)),
            channel,
            name,
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> V::Snapshot {
        self.view.borrow().snapshot()
    }

    /// The replay-latest snapshot stream.
    pub fn stream(&self) -> PushChannel<V::Snapshot> {
        self.channel.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    fn mutate(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut V) -> MutationOutcome,
    ) -> MutationOutcome {
        let (outcome, snapshot) = {
            let mut view = self.view.borrow_mut();
            let outcome = apply(&mut view);
            (outcome, view.snapshot())
        };
        match outcome {
            MutationOutcome::Rejected(reason) => {
                debug!(host = self.name, op, ?reason, "mutation rejected");
                return outcome;
            }
            MutationOutcome::Clamped => debug!(host = self.name, op, "mutation clamped"),
            MutationOutcome::Applied => trace!(host = self.name, op, "mutation applied"),
        }
        self.channel.push(snapshot);
        outcome
    }

    fn bind<G: 'static>(
        &self,
        source: &dyn Observable<G>,
        op: &'static str,
        apply: fn(&mut V, G) -> MutationOutcome,
    ) -> Subscription {
        let host = self.clone();
        source.subscribe(observer_fn(move |gesture| {
            host.mutate(op, |view| apply(view, gesture));
        }))
    }
}

impl<V: ViewModel> Clone for ViewportHost<V> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            channel: self.channel.clone(),
            name: self.name,
        }
    }
}

impl ViewportHost<LinearView> {
    pub fn set(&self, start: i64, end: i64) -> MutationOutcome {
        self.mutate("set", |v| v.set(start, end))
    }

    pub fn translate(&self, delta: i64) -> MutationOutcome {
        self.mutate("translate", |v| v.translate(delta))
    }

    pub fn zoom(&self, anchor: f64, scale: f64) -> MutationOutcome {
        self.mutate("zoom", |v| v.zoom_with_focus(anchor, scale))
    }

    pub fn center_at(&self, bp: i64) -> MutationOutcome {
        self.mutate("center_at", |v| v.center_at(bp))
    }

    pub fn reset(&self) -> MutationOutcome {
        self.mutate("reset", LinearView::reset)
    }

    /// Frame a graph segment: center on it when it fits in the current
    /// window, otherwise show exactly its range. `None` for unknown segments.
    pub fn center_on_segment(
        &self,
        coords: &dyn CoordinateSystem,
        segment: SegmentId,
    ) -> Option<MutationOutcome> {
        let range = coords.segment_range(segment)?;
        let outcome = self.mutate("center_on_segment", |v| {
            if range.len() <= v.len() {
                v.center_at(range.start + range.len() / 2)
            } else {
                v.set(range.start, range.end)
            }
        });
        Some(outcome)
    }

    pub fn subscribe_zoom(&self, source: &dyn Observable<ZoomGesture>) -> Subscription {
        self.bind(source, "zoom", |v, g| v.zoom_with_focus(g.anchor, g.scale))
    }

    pub fn subscribe_drag(&self, source: &dyn Observable<DragGesture>) -> Subscription {
        self.bind(source, "drag", |v, g| v.pan(g.dx))
    }

    pub fn subscribe_center(&self, source: &dyn Observable<CenterGesture>) -> Subscription {
        self.bind(source, "center_at", |v, g| v.center_at(g.bp))
    }
}

impl ViewportHost<SpatialView> {
    pub fn set_center(&self, x: f64, y: f64) -> MutationOutcome {
        self.mutate("set_center", |v| v.set_center(x, y))
    }

    pub fn translate_rel(&self, dx: f64, dy: f64) -> MutationOutcome {
        self.mutate("translate_rel", |v| v.translate_rel(dx, dy))
    }

    pub fn zoom(&self, tx: f64, ty: f64, scale: f64) -> MutationOutcome {
        self.mutate("zoom", |v| v.zoom_with_focus(tx, ty, scale))
    }

    pub fn fit(&self, bounds: Rect, margin: f64) -> MutationOutcome {
        self.mutate("fit", |v| v.fit(bounds, margin))
    }

    pub fn subscribe_zoom(&self, source: &dyn Observable<SpatialZoomGesture>) -> Subscription {
        self.bind(source, "zoom", |v, g| {
            v.zoom_with_focus(g.anchor.x, g.anchor.y, g.scale)
        })
    }

    pub fn subscribe_drag(&self, source: &dyn Observable<DragGesture>) -> Subscription {
        self.bind(source, "drag", |v, g| v.translate_rel(g.dx, g.dy))
    }
}
