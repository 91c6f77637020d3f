use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bpview_protocol::{ProxyId, WireValue};

use crate::endpoint::Endpoint;
use crate::error::TransportError;

/// Local handle to an object exposed by the peer.
///
/// Clones share one release flag: once any clone is released, every call
/// through any of them fails with [`TransportError::Released`] and nothing
/// is sent.
#[derive(Clone)]
pub struct RemoteProxy {
    endpoint: Endpoint,
    target: ProxyId,
    released: Rc<Cell<bool>>,
}

impl RemoteProxy {
    pub(crate) fn new(endpoint: Endpoint, target: ProxyId) -> Self {
        Self {
            endpoint,
            target,
            released: Rc::new(Cell::new(false)),
        }
    }

    pub fn target(&self) -> ProxyId {
        self.target
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    pub async fn call(
        &self,
        method: &str,
        args: Vec<WireValue>,
    ) -> Result<WireValue, TransportError> {
        if self.is_released() {
            return Err(TransportError::Released(self.target));
        }
        self.endpoint.call(self.target, method, args).await
    }

    pub fn notify(&self, method: &str, args: Vec<WireValue>) -> Result<(), TransportError> {
        if self.is_released() {
            return Err(TransportError::Released(self.target));
        }
        self.endpoint.notify(self.target, method, args)
    }

    /// Let the peer drop the object. Only the first call sends anything.
    pub fn release(&self) {
        if !self.released.replace(true) {
            self.endpoint.release_remote(self.target);
        }
    }
}

impl fmt::Debug for RemoteProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProxy")
            .field("target", &self.target)
            .field("released", &self.released.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bpview_protocol::RemoteFault;

    use super::*;
    use crate::endpoint::Exposed;
    use crate::transport::port_pair;

    struct Echo;

    impl Exposed for Echo {
        fn invoke(
            &self,
            _method: &str,
            mut args: Vec<WireValue>,
            _endpoint: &Endpoint,
        ) -> Result<WireValue, RemoteFault> {
            Ok(args.pop().unwrap_or_else(WireValue::unit))
        }
    }

    #[tokio::test]
    async fn release_is_idempotent_and_makes_calls_inert() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let (a, b) = port_pair();
                let client = Endpoint::new(a);
                let server = Endpoint::new(b);
                let id = server.expose(Rc::new(Echo));
                client.spawn();
                server.spawn();

                let proxy = client.proxy(id);
                let twin = proxy.clone();
                let value = proxy.call("echo", vec![WireValue::data(&7).unwrap()]).await.unwrap();
                assert_eq!(value.decode::<i32>().unwrap(), 7);

                proxy.release();
                twin.release();
                assert!(twin.is_released());
                let err = twin.call("echo", vec![]).await.unwrap_err();
                assert!(matches!(err, TransportError::Released(target) if target == id));
                assert!(proxy.notify("echo", vec![]).unwrap_err().is_teardown());

                // The release reaches the server after the echo reply.
                for _ in 0..8 {
                    tokio::task::yield_now().await;
                }
                assert_eq!(server.exposed_count(), 0);
            })
            .await;
    }
}
