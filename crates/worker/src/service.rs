//! The worker's root object: routes method names onto the viewport hosts.

use std::rc::Rc;

use bpview_core::{
    GraphContext, LinearView, Observable, SegmentId, SpatialView, Subscription, ViewError,
    ViewportHost, ViewportHosts,
};
use bpview_protocol::{
    CenterGesture, DragGesture, LinearSnapshot, Rect, RemoteFault, SpatialSnapshot,
    SpatialZoomGesture, WireValue, ZoomGesture,
};
use bpview_rpc::{Endpoint, Exposed, ObservableBridge, SubscriptionBridge, TransferHandler, arg};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct ViewportService {
    context: GraphContext,
    linear: ViewportHost<LinearView>,
    spatial: ViewportHost<SpatialView>,
}

impl ViewportService {
    pub fn new(context: GraphContext) -> Result<Self, ViewError> {
        let ViewportHosts { linear, spatial } = ViewportHosts::new(&context)?;
        Ok(Self {
            context,
            linear,
            spatial,
        })
    }

    pub fn linear(&self) -> &ViewportHost<LinearView> {
        &self.linear
    }

    pub fn spatial(&self) -> &ViewportHost<SpatialView> {
        &self.spatial
    }
}

fn reply<T: Serialize>(value: &T) -> Result<WireValue, RemoteFault> {
    Ok(WireValue::data(value)?)
}

fn stream<T>(source: Rc<dyn Observable<T>>, endpoint: &Endpoint) -> WireValue
where
    T: Serialize + DeserializeOwned + 'static,
{
    ObservableBridge::<T>::new().serialize(source, endpoint)
}

/// Subscribe a host to a gesture stream living on the caller's side and hand
/// back the binding's cancellation handle.
fn bind<G>(
    args: &[WireValue],
    endpoint: &Endpoint,
    subscribe: impl FnOnce(&dyn Observable<G>) -> Subscription,
) -> Result<WireValue, RemoteFault>
where
    G: Serialize + DeserializeOwned + 'static,
{
    let wire = args
        .first()
        .ok_or_else(|| RemoteFault::bad_arguments("missing gesture stream"))?;
    let gestures = ObservableBridge::<G>::new().deserialize(wire, endpoint)?;
    let subscription = subscribe(gestures.as_ref());
    Ok(SubscriptionBridge.serialize(subscription, endpoint))
}

impl Exposed for ViewportService {
    fn invoke(
        &self,
        method: &str,
        args: Vec<WireValue>,
        endpoint: &Endpoint,
    ) -> Result<WireValue, RemoteFault> {
        let linear = &self.linear;
        let spatial = &self.spatial;
        match method {
            "linear.get" => reply(&linear.get()),
            "linear.set" => reply(&linear.set(arg(&args, 0)?, arg(&args, 1)?)),
            "linear.translate" => reply(&linear.translate(arg(&args, 0)?)),
            "linear.zoom" => reply(&linear.zoom(arg(&args, 0)?, arg(&args, 1)?)),
            "linear.centerAt" => reply(&linear.center_at(arg(&args, 0)?)),
            "linear.centerOnSegment" => {
                let segment: SegmentId = arg(&args, 0)?;
                reply(&linear.center_on_segment(self.context.coords().as_ref(), segment))
            }
            "linear.reset" => reply(&linear.reset()),
            "linear.stream" => Ok(stream::<LinearSnapshot>(
                Rc::new(linear.stream()),
                endpoint,
            )),
            "linear.bindZoom" => bind::<ZoomGesture>(&args, endpoint, |g| linear.subscribe_zoom(g)),
            "linear.bindDrag" => bind::<DragGesture>(&args, endpoint, |g| linear.subscribe_drag(g)),
            "linear.bindCenter" => {
                bind::<CenterGesture>(&args, endpoint, |g| linear.subscribe_center(g))
            }

            "spatial.get" => reply(&spatial.get()),
            "spatial.setCenter" => reply(&spatial.set_center(arg(&args, 0)?, arg(&args, 1)?)),
            "spatial.translate" => reply(&spatial.translate_rel(arg(&args, 0)?, arg(&args, 1)?)),
            "spatial.zoom" => reply(&spatial.zoom(
                arg(&args, 0)?,
                arg(&args, 1)?,
                arg(&args, 2)?,
            )),
            "spatial.fit" => {
                let bounds: Rect = arg(&args, 0)?;
                reply(&spatial.fit(bounds, arg(&args, 1)?))
            }
            "spatial.stream" => Ok(stream::<SpatialSnapshot>(
                Rc::new(spatial.stream()),
                endpoint,
            )),
            "spatial.bindZoom" => {
                bind::<SpatialZoomGesture>(&args, endpoint, |g| spatial.subscribe_zoom(g))
            }
            "spatial.bindDrag" => {
                bind::<DragGesture>(&args, endpoint, |g| spatial.subscribe_drag(g))
            }

            other => Err(RemoteFault::unknown_method(other)),
        }
    }
}
