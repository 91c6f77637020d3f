use bpview_protocol::{ProxyId, RemoteFault};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The port is closed; the other context is gone or shutting down.
    #[error("transport torn down")]
    TornDown,
    /// The local proxy handle was released before this call.
    #[error("proxy {0} already released")]
    Released(ProxyId),
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteFault),
    #[error("payload could not be encoded or decoded: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

impl TransportError {
    /// Errors that only mean the other side went away. Callers doing
    /// best-effort teardown ignore these.
    pub fn is_teardown(&self) -> bool {
        matches!(self, Self::TornDown | Self::Released(_))
    }
}

impl From<TransportError> for RemoteFault {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Remote(fault) => fault,
            TransportError::Payload(err) => RemoteFault::from(err),
            TransportError::UnexpectedShape { .. } => RemoteFault::bad_arguments(err),
            other => RemoteFault::new(bpview_protocol::FaultKind::Failed, other.to_string()),
        }
    }
}
