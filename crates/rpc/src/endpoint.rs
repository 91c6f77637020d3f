//! One side of a connection: the table of objects this side exposes, the
//! calls it is waiting on, and the loop dispatching incoming messages.
//!
//! An endpoint is `!Send` and lives on a single-threaded event loop. Its
//! dispatch loop must run inside a [`tokio::task::LocalSet`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use bpview_protocol::{CallId, ProxyId, RemoteFault, WireMessage, WireValue};
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::TransportError;
use crate::proxy::RemoteProxy;
use crate::transport::Port;

/// An object the peer can call through a proxy.
pub trait Exposed {
    /// Handle one remote call. Runs synchronously on the dispatch loop.
    fn invoke(
        &self,
        method: &str,
        args: Vec<WireValue>,
        endpoint: &Endpoint,
    ) -> Result<WireValue, RemoteFault>;

    /// The connection is gone; no more calls will arrive.
    fn peer_closed(&self) {}
}

type PendingReply = oneshot::Sender<Result<WireValue, RemoteFault>>;

struct Inner {
    tx: RefCell<Option<mpsc::UnboundedSender<WireMessage>>>,
    rx: RefCell<Option<mpsc::UnboundedReceiver<WireMessage>>>,
    objects: RefCell<HashMap<ProxyId, Rc<dyn Exposed>>>,
    pending: RefCell<HashMap<CallId, PendingReply>>,
    next_object: Cell<u64>,
    next_call: Cell<u64>,
    closed: Cell<bool>,
}

/// Cheap handle to one side of a connection.
#[derive(Clone)]
pub struct Endpoint {
    inner: Rc<Inner>,
}

impl Endpoint {
    pub fn new(port: Port) -> Self {
        Self {
            inner: Rc::new(Inner {
                tx: RefCell::new(Some(port.tx)),
                rx: RefCell::new(Some(port.rx)),
                objects: RefCell::new(HashMap::new()),
                pending: RefCell::new(HashMap::new()),
                next_object: Cell::new(ProxyId::ROOT.0 + 1),
                next_call: Cell::new(1),
                closed: Cell::new(false),
            }),
        }
    }

    /// Put `object` in the table and return the id the peer addresses it by.
    pub fn expose(&self, object: Rc<dyn Exposed>) -> ProxyId {
        let id = ProxyId(self.inner.next_object.get());
        self.inner.next_object.set(id.0 + 1);
        self.inner.objects.borrow_mut().insert(id, object);
        trace!(target_id = %id, "exposed object");
        id
    }

    /// Expose the object the peer reaches through [`ProxyId::ROOT`].
    pub fn expose_root(&self, object: Rc<dyn Exposed>) {
        self.inner.objects.borrow_mut().insert(ProxyId::ROOT, object);
    }

    /// Drop an object from the table. Later calls to it fail remotely.
    pub fn revoke(&self, id: ProxyId) -> bool {
        self.inner.objects.borrow_mut().remove(&id).is_some()
    }

    pub fn exposed_count(&self) -> usize {
        self.inner.objects.borrow().len()
    }

    pub fn pending_calls(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Handle to an object living on the peer.
    pub fn proxy(&self, target: ProxyId) -> RemoteProxy {
        RemoteProxy::new(self.clone(), target)
    }

    /// Handle to the peer's root object.
    pub fn root(&self) -> RemoteProxy {
        self.proxy(ProxyId::ROOT)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Call `method` on the peer's object `target` and wait for the reply.
    pub async fn call(
        &self,
        target: ProxyId,
        method: &str,
        args: Vec<WireValue>,
    ) -> Result<WireValue, TransportError> {
        if self.is_closed() {
            return Err(TransportError::TornDown);
        }
        let id = CallId(self.inner.next_call.get());
        self.inner.next_call.set(id.0 + 1);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner.pending.borrow_mut().insert(id, reply_tx);

        let sent = self.send(WireMessage::Call {
            id,
            target,
            method: method.to_owned(),
            args,
        });
        if let Err(err) = sent {
            self.inner.pending.borrow_mut().remove(&id);
            return Err(err);
        }

        match reply_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) => Err(TransportError::Remote(fault)),
            Err(_) => Err(TransportError::TornDown),
        }
    }

    /// Fire-and-forget call.
    pub fn notify(
        &self,
        target: ProxyId,
        method: &str,
        args: Vec<WireValue>,
    ) -> Result<(), TransportError> {
        self.send(WireMessage::Notify {
            target,
            method: method.to_owned(),
            args,
        })
    }

    /// Tell the peer this side holds no more references to `target`.
    pub fn release_remote(&self, target: ProxyId) {
        if let Err(err) = self.send(WireMessage::Release { target }) {
            debug!(target_id = %target, %err, "release after teardown ignored");
        }
    }

    /// Run the dispatch loop on the current `LocalSet`.
    pub fn spawn(&self) -> JoinHandle<()> {
        tokio::task::spawn_local(self.clone().run())
    }

    /// Dispatch incoming messages until the peer goes away, then close.
    pub async fn run(self) {
        let Some(mut rx) = self.inner.rx.borrow_mut().take() else {
            warn!("endpoint dispatch loop already running");
            return;
        };
        while let Some(message) = rx.recv().await {
            if self.is_closed() {
                trace!("dropping message received after close");
                continue;
            }
            self.dispatch(message);
        }
        trace!("peer disconnected");
        self.close();
    }

    /// Close this side: stop sending, fail every pending call with
    /// [`TransportError::TornDown`] and empty the object table.
    pub fn close(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        self.inner.tx.borrow_mut().take();
        // Dropping the senders wakes each waiting call with an error.
        let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
        let objects = std::mem::take(&mut *self.inner.objects.borrow_mut());
        debug!(
            pending = pending.len(),
            objects = objects.len(),
            "endpoint closed"
        );
        drop(pending);
        for object in objects.into_values() {
            object.peer_closed();
        }
    }

    fn send(&self, message: WireMessage) -> Result<(), TransportError> {
        let tx = self.inner.tx.borrow();
        let tx = tx.as_ref().ok_or(TransportError::TornDown)?;
        tx.send(message).map_err(|_| TransportError::TornDown)
    }

    fn lookup(&self, target: ProxyId) -> Option<Rc<dyn Exposed>> {
        self.inner.objects.borrow().get(&target).cloned()
    }

    fn dispatch(&self, message: WireMessage) {
        match message {
            WireMessage::Call {
                id,
                target,
                method,
                args,
            } => {
                trace!(call = id.0, target_id = %target, %method, "call");
                let result = match self.lookup(target) {
                    Some(object) => object.invoke(&method, args, self),
                    None => Err(RemoteFault::unknown_target(target)),
                };
                if let Err(fault) = &result {
                    debug!(target_id = %target, %method, %fault, "call failed");
                }
                if let Err(err) = self.send(WireMessage::Reply { id, result }) {
                    debug!(call = id.0, %err, "reply dropped");
                }
            }
            WireMessage::Notify {
                target,
                method,
                args,
            } => {
                trace!(target_id = %target, %method, "notify");
                let Some(object) = self.lookup(target) else {
                    // Cancelled while the notification was in flight.
                    debug!(target_id = %target, %method, "notify for released object dropped");
                    return;
                };
                if let Err(fault) = object.invoke(&method, args, self) {
                    debug!(target_id = %target, %method, %fault, "notify failed");
                }
            }
            WireMessage::Reply { id, result } => {
                trace!(call = id.0, ok = result.is_ok(), "reply");
                let Some(waiter) = self.inner.pending.borrow_mut().remove(&id) else {
                    warn!(call = id.0, "reply for unknown call");
                    return;
                };
                // The caller may have stopped waiting.
                let _ = waiter.send(result);
            }
            WireMessage::Release { target } => {
                let released = self.revoke(target);
                trace!(target_id = %target, released, "release");
            }
        }
    }
}

/// Decode positional argument `index` of a call.
pub fn arg<T: DeserializeOwned>(args: &[WireValue], index: usize) -> Result<T, RemoteFault> {
    let value = args
        .get(index)
        .ok_or_else(|| RemoteFault::bad_arguments(format!("missing argument {index}")))?;
    Ok(value.decode()?)
}
