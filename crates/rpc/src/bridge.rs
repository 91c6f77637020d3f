//! Transfer handlers carrying push streams and their cancellation handles
//! across an endpoint.
//!
//! Serializing an observable exposes it and sends a tagged proxy. The other
//! side rebuilds a local [`Observable`] whose `subscribe` exposes a proxied
//! observer, asks the origin to subscribe it, and returns a [`Subscription`]
//! that cancels remotely and then releases the handle. Each subscribe
//! through the bridge is independent; fan-out stays with the origin stream.
//! The origin keeps the exposed stream until the last local handle to the
//! rebuilt one is dropped and every subscribe sent through it has been
//! answered.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::rc::Rc;

use bpview_core::{Observable, Observer, StreamError, Subscription};
use bpview_protocol::{ProxyId, RemoteFault, WireValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::endpoint::{Endpoint, Exposed, arg};
use crate::error::TransportError;
use crate::proxy::RemoteProxy;

pub const OBSERVABLE: &str = "observable";
pub const SUBSCRIPTION: &str = "subscription";

/// Turns a local value that cannot cross the port into a tagged wire value
/// and back.
pub trait TransferHandler {
    type Local;

    /// Tag written into [`WireValue::Handled`].
    fn name(&self) -> &'static str;

    fn can_handle(&self, value: &WireValue) -> bool {
        value.handler() == Some(self.name())
    }

    fn serialize(&self, value: Self::Local, endpoint: &Endpoint) -> WireValue;

    fn deserialize(
        &self,
        value: &WireValue,
        endpoint: &Endpoint,
    ) -> Result<Self::Local, TransportError>;
}

fn tagged(handler: &'static str, id: ProxyId) -> WireValue {
    WireValue::Handled {
        handler: handler.to_owned(),
        value: Box::new(WireValue::Proxy(id)),
    }
}

fn untag(handler: &'static str, value: &WireValue) -> Result<ProxyId, TransportError> {
    match value {
        WireValue::Handled { handler: tag, value } if tag == handler => {
            value.as_proxy().ok_or(TransportError::UnexpectedShape {
                expected: "proxy",
                found: value.kind(),
            })
        }
        other => Err(TransportError::UnexpectedShape {
            expected: handler,
            found: other.kind(),
        }),
    }
}

// --- Observables ---

/// Transfer handler for `Rc<dyn Observable<T>>`.
pub struct ObservableBridge<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ObservableBridge<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ObservableBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned + 'static> TransferHandler for ObservableBridge<T> {
    type Local = Rc<dyn Observable<T>>;

    fn name(&self) -> &'static str {
        OBSERVABLE
    }

    fn serialize(&self, source: Rc<dyn Observable<T>>, endpoint: &Endpoint) -> WireValue {
        let id = endpoint.expose(Rc::new(ExposedObservable { source }));
        tagged(OBSERVABLE, id)
    }

    fn deserialize(
        &self,
        value: &WireValue,
        endpoint: &Endpoint,
    ) -> Result<Rc<dyn Observable<T>>, TransportError> {
        let id = untag(OBSERVABLE, value)?;
        Ok(Rc::new(RemoteObservable::<T> {
            handle: Rc::new(StreamHandle(endpoint.proxy(id))),
            _marker: PhantomData,
        }))
    }
}

/// Origin side: the real stream behind a `subscribe`-only proxy.
struct ExposedObservable<T> {
    source: Rc<dyn Observable<T>>,
}

impl<T: Serialize + 'static> Exposed for ExposedObservable<T> {
    fn invoke(
        &self,
        method: &str,
        args: Vec<WireValue>,
        endpoint: &Endpoint,
    ) -> Result<WireValue, RemoteFault> {
        if method != "subscribe" {
            return Err(RemoteFault::unknown_method(method));
        }
        let observer_id = args
            .first()
            .and_then(WireValue::as_proxy)
            .ok_or_else(|| RemoteFault::bad_arguments("subscribe expects an observer proxy"))?;
        let observer = endpoint.proxy(observer_id);
        let mut subscription = self.source.subscribe(Rc::new(RemoteObserver::<T> {
            proxy: observer.clone(),
            _marker: PhantomData,
        }));
        subscription.add(move || observer.release());
        Ok(SubscriptionBridge.serialize(subscription, endpoint))
    }
}

/// Origin side: forwards every notification to the subscriber's observer.
struct RemoteObserver<T> {
    proxy: RemoteProxy,
    _marker: PhantomData<fn(T)>,
}

impl<T> RemoteObserver<T> {
    fn forward(&self, method: &str, args: Vec<WireValue>) {
        if let Err(err) = self.proxy.notify(method, args) {
            debug!(target_id = %self.proxy.target(), method, %err, "notification not sent");
        }
    }
}

impl<T: Serialize> Observer<T> for RemoteObserver<T> {
    fn next(&self, value: T) {
        match WireValue::data(&value) {
            Ok(value) => self.forward("next", vec![value]),
            Err(err) => warn!(%err, "stream value could not be encoded"),
        }
    }

    fn error(&self, error: StreamError) {
        match WireValue::data(&error) {
            Ok(value) => self.forward("error", vec![value]),
            Err(err) => warn!(%err, "stream error could not be encoded"),
        }
    }

    fn complete(&self) {
        self.forward("complete", Vec::new());
    }
}

/// Subscriber side: the proxy to an exposed stream. Released when the last
/// holder lets go; in-flight subscribe calls hold it too, so the release
/// never overtakes them.
struct StreamHandle(RemoteProxy);

impl Drop for StreamHandle {
    fn drop(&mut self) {
        trace!(target_id = %self.0.target(), "releasing bridged stream");
        self.0.release();
    }
}

/// Subscriber side: the rebuilt stream.
struct RemoteObservable<T> {
    handle: Rc<StreamHandle>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + 'static> Observable<T> for RemoteObservable<T> {
    fn subscribe(&self, observer: Rc<dyn Observer<T>>) -> Subscription {
        let endpoint = self.handle.0.endpoint().clone();
        let link = Rc::new(RemoteLink {
            endpoint: endpoint.clone(),
            observer,
            observer_id: Cell::new(None),
            remote: RefCell::new(None),
            cancelled: Cell::new(false),
        });
        let observer_id = endpoint.expose(Rc::new(ExposedObserver { link: link.clone() }));
        link.observer_id.set(Some(observer_id));

        if endpoint.is_closed() {
            link.cancel();
            return Subscription::empty();
        }

        let handle = self.handle.clone();
        let pending = link.clone();
        tokio::task::spawn_local(async move {
            let proxy = &handle.0;
            let reply = proxy
                .call("subscribe", vec![WireValue::Proxy(observer_id)])
                .await
                .and_then(|reply| SubscriptionBridge.deserialize(&reply, proxy.endpoint()));
            match reply {
                Ok(remote) => pending.attach(remote),
                Err(err) => pending.fail(&err),
            }
        });

        Subscription::new(move || link.cancel())
    }
}

/// Subscriber-side state of one bridged subscription.
struct RemoteLink<T> {
    endpoint: Endpoint,
    observer: Rc<dyn Observer<T>>,
    observer_id: Cell<Option<ProxyId>>,
    /// The origin's cancellation handle, once the subscribe reply is in.
    remote: RefCell<Option<Subscription>>,
    cancelled: Cell<bool>,
}

impl<T> RemoteLink<T> {
    fn attach(&self, mut remote: Subscription) {
        if self.cancelled.get() {
            // Cancelled before the origin answered.
            remote.unsubscribe();
        } else {
            *self.remote.borrow_mut() = Some(remote);
        }
    }

    fn fail(&self, err: &TransportError) {
        if self.cancelled.get() {
            return;
        }
        if err.is_teardown() {
            debug!(%err, "bridged subscribe after teardown");
        } else {
            warn!(%err, "bridged subscribe failed");
            self.observer.error(StreamError(err.to_string()));
        }
        self.cancel();
    }

    /// Stop delivery, drop the local observer proxy and cancel remotely.
    /// Only the first call does anything.
    fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(id) = self.observer_id.take() {
            self.endpoint.revoke(id);
        }
        let remote = self.remote.borrow_mut().take();
        if let Some(mut remote) = remote {
            remote.unsubscribe();
        }
    }

    fn next(&self, value: T) {
        if !self.cancelled.get() {
            self.observer.next(value);
        }
    }

    fn error(&self, error: StreamError) {
        if !self.cancelled.get() {
            self.observer.error(error);
            self.cancel();
        }
    }

    fn complete(&self) {
        if !self.cancelled.get() {
            self.observer.complete();
            self.cancel();
        }
    }
}

/// Subscriber side: the proxied observer the origin notifies.
struct ExposedObserver<T> {
    link: Rc<RemoteLink<T>>,
}

impl<T: DeserializeOwned> Exposed for ExposedObserver<T> {
    fn invoke(
        &self,
        method: &str,
        args: Vec<WireValue>,
        _endpoint: &Endpoint,
    ) -> Result<WireValue, RemoteFault> {
        match method {
            "next" => match arg::<T>(&args, 0) {
                Ok(value) => self.link.next(value),
                Err(fault) => {
                    warn!(%fault, "undecodable stream value dropped");
                    return Err(fault);
                }
            },
            "error" => self.link.error(arg(&args, 0)?),
            "complete" => self.link.complete(),
            other => return Err(RemoteFault::unknown_method(other)),
        }
        Ok(WireValue::unit())
    }

    fn peer_closed(&self) {
        debug!("origin of bridged stream went away");
        self.link.cancel();
    }
}

// --- Subscriptions ---

/// Transfer handler for [`Subscription`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionBridge;

impl TransferHandler for SubscriptionBridge {
    type Local = Subscription;

    fn name(&self) -> &'static str {
        SUBSCRIPTION
    }

    fn serialize(&self, subscription: Subscription, endpoint: &Endpoint) -> WireValue {
        let id = endpoint.expose(Rc::new(ExposedSubscription {
            subscription: RefCell::new(subscription),
        }));
        tagged(SUBSCRIPTION, id)
    }

    fn deserialize(
        &self,
        value: &WireValue,
        endpoint: &Endpoint,
    ) -> Result<Subscription, TransportError> {
        let proxy = endpoint.proxy(untag(SUBSCRIPTION, value)?);
        Ok(Subscription::new(move || cancel_remote(proxy)))
    }
}

/// Ask the origin to unsubscribe, then release the handle. Teardown errors
/// resolve to nothing.
fn cancel_remote(proxy: RemoteProxy) {
    if proxy.endpoint().is_closed() {
        trace!(target_id = %proxy.target(), "cancel after teardown is a no-op");
        proxy.release();
        return;
    }
    tokio::task::spawn_local(async move {
        match proxy.call("unsubscribe", Vec::new()).await {
            Ok(_) => trace!(target_id = %proxy.target(), "remote subscription cancelled"),
            Err(err) if err.is_teardown() => {
                debug!(target_id = %proxy.target(), "cancel after teardown is a no-op");
            }
            Err(err) => warn!(target_id = %proxy.target(), %err, "remote unsubscribe failed"),
        }
        proxy.release();
    });
}

/// Origin side: the real cancellation handle.
struct ExposedSubscription {
    subscription: RefCell<Subscription>,
}

impl ExposedSubscription {
    fn cancel(&self) {
        let mut subscription = std::mem::take(&mut *self.subscription.borrow_mut());
        subscription.unsubscribe();
    }
}

impl Exposed for ExposedSubscription {
    fn invoke(
        &self,
        method: &str,
        _args: Vec<WireValue>,
        _endpoint: &Endpoint,
    ) -> Result<WireValue, RemoteFault> {
        match method {
            "unsubscribe" => {
                self.cancel();
                Ok(WireValue::unit())
            }
            other => Err(RemoteFault::unknown_method(other)),
        }
    }

    fn peer_closed(&self) {
        self.cancel();
    }
}
