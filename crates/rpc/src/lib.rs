//! Connects two single-threaded contexts over an ordered message port.
//!
//! Each side builds an [`Endpoint`] on its end of a [`port_pair`], exposes
//! objects, and calls the peer's objects through [`RemoteProxy`] handles.
//! Values that cannot be copied across, push streams and their
//! subscriptions, go through a [`TransferHandler`].

pub mod bridge;
pub mod endpoint;
pub mod error;
pub mod proxy;
pub mod transport;

pub use bridge::{ObservableBridge, SubscriptionBridge, TransferHandler};
pub use endpoint::{Endpoint, Exposed, arg};
pub use error::TransportError;
pub use proxy::RemoteProxy;
pub use transport::{Port, port_pair};
