use std::rc::Rc;

use bpview_core::{MutationOutcome, Observable, SegmentId, Subscription};
use bpview_protocol::{
    CenterGesture, DragGesture, LinearSnapshot, Rect, SpatialSnapshot, SpatialZoomGesture,
    WireValue, ZoomGesture,
};
use bpview_rpc::{
    Endpoint, ObservableBridge, RemoteProxy, SubscriptionBridge, TransferHandler, TransportError,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Typed calls into a worker's [`ViewportService`](crate::ViewportService).
///
/// Every call is asynchronous; mutations resolve to the outcome the worker
/// applied once the reply comes back.
#[derive(Clone)]
pub struct ViewportClient {
    root: RemoteProxy,
}

impl ViewportClient {
    pub fn new(endpoint: &Endpoint) -> Self {
        Self {
            root: endpoint.root(),
        }
    }

    fn endpoint(&self) -> &Endpoint {
        self.root.endpoint()
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<WireValue>,
    ) -> Result<R, TransportError> {
        let value = self.root.call(method, args).await?;
        Ok(value.decode()?)
    }

    async fn stream<T>(&self, method: &str) -> Result<Rc<dyn Observable<T>>, TransportError>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let value = self.root.call(method, Vec::new()).await?;
        ObservableBridge::<T>::new().deserialize(&value, self.endpoint())
    }

    async fn bind<G>(
        &self,
        method: &str,
        gestures: Rc<dyn Observable<G>>,
    ) -> Result<Subscription, TransportError>
    where
        G: Serialize + DeserializeOwned + 'static,
    {
        let wire = ObservableBridge::<G>::new().serialize(gestures, self.endpoint());
        let value = self.root.call(method, vec![wire]).await?;
        SubscriptionBridge.deserialize(&value, self.endpoint())
    }

    pub async fn linear_get(&self) -> Result<LinearSnapshot, TransportError> {
        self.request("linear.get", Vec::new()).await
    }

    pub async fn linear_set(
        &self,
        start: i64,
        end: i64,
    ) -> Result<MutationOutcome, TransportError> {
        self.request("linear.set", vec![WireValue::data(&start)?, WireValue::data(&end)?])
            .await
    }

    pub async fn linear_translate(&self, delta: i64) -> Result<MutationOutcome, TransportError> {
        self.request("linear.translate", vec![WireValue::data(&delta)?])
            .await
    }

    pub async fn linear_zoom(
        &self,
        anchor: f64,
        scale: f64,
    ) -> Result<MutationOutcome, TransportError> {
        self.request(
            "linear.zoom",
            vec![WireValue::data(&anchor)?, WireValue::data(&scale)?],
        )
        .await
    }

    pub async fn linear_center_at(&self, bp: i64) -> Result<MutationOutcome, TransportError> {
        self.request("linear.centerAt", vec![WireValue::data(&bp)?])
            .await
    }

    /// `None` when the worker's coordinate system does not know `segment`.
    pub async fn linear_center_on_segment(
        &self,
        segment: SegmentId,
    ) -> Result<Option<MutationOutcome>, TransportError> {
        self.request("linear.centerOnSegment", vec![WireValue::data(&segment)?])
            .await
    }

    pub async fn linear_reset(&self) -> Result<MutationOutcome, TransportError> {
        self.request("linear.reset", Vec::new()).await
    }

    /// The linear host's replay-latest snapshot stream.
    pub async fn linear_stream(
        &self,
    ) -> Result<Rc<dyn Observable<LinearSnapshot>>, TransportError> {
        self.stream("linear.stream").await
    }

    pub async fn bind_linear_zoom(
        &self,
        gestures: Rc<dyn Observable<ZoomGesture>>,
    ) -> Result<Subscription, TransportError> {
        self.bind("linear.bindZoom", gestures).await
    }

    pub async fn bind_linear_drag(
        &self,
        gestures: Rc<dyn Observable<DragGesture>>,
    ) -> Result<Subscription, TransportError> {
        self.bind("linear.bindDrag", gestures).await
    }

    pub async fn bind_linear_center(
        &self,
        gestures: Rc<dyn Observable<CenterGesture>>,
    ) -> Result<Subscription, TransportError> {
        self.bind("linear.bindCenter", gestures).await
    }

    pub async fn spatial_get(&self) -> Result<SpatialSnapshot, TransportError> {
        self.request("spatial.get", Vec::new()).await
    }

    pub async fn spatial_set_center(
        &self,
        x: f64,
        y: f64,
    ) -> Result<MutationOutcome, TransportError> {
        self.request(
            "spatial.setCenter",
            vec![WireValue::data(&x)?, WireValue::data(&y)?],
        )
        .await
    }

    pub async fn spatial_translate(
        &self,
        dx: f64,
        dy: f64,
    ) -> Result<MutationOutcome, TransportError> {
        self.request(
            "spatial.translate",
            vec![WireValue::data(&dx)?, WireValue::data(&dy)?],
        )
        .await
    }

    pub async fn spatial_zoom(
        &self,
        tx: f64,
        ty: f64,
        scale: f64,
    ) -> Result<MutationOutcome, TransportError> {
        self.request(
            "spatial.zoom",
            vec![
                WireValue::data(&tx)?,
                WireValue::data(&ty)?,
                WireValue::data(&scale)?,
            ],
        )
        .await
    }

    pub async fn spatial_fit(
        &self,
        bounds: Rect,
        margin: f64,
    ) -> Result<MutationOutcome, TransportError> {
        self.request(
            "spatial.fit",
            vec![WireValue::data(&bounds)?, WireValue::data(&margin)?],
        )
        .await
    }

    pub async fn spatial_stream(
        &self,
    ) -> Result<Rc<dyn Observable<SpatialSnapshot>>, TransportError> {
        self.stream("spatial.stream").await
    }

    pub async fn bind_spatial_zoom(
        &self,
        gestures: Rc<dyn Observable<SpatialZoomGesture>>,
    ) -> Result<Subscription, TransportError> {
        self.bind("spatial.bindZoom", gestures).await
    }

    pub async fn bind_spatial_drag(
        &self,
        gestures: Rc<dyn Observable<DragGesture>>,
    ) -> Result<Subscription, TransportError> {
        self.bind("spatial.bindDrag", gestures).await
    }
}
