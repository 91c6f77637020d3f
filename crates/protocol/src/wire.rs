//! Structured messages carried over the ordered port between two contexts.
//!
//! Only plain data crosses: JSON payloads, opaque object references, and
//! transfer-handler tagged values. Live objects never do.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to an object exposed by the side that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProxyId(pub u64);

impl ProxyId {
    /// The object each side exposes before any other.
    pub const ROOT: ProxyId = ProxyId(0);
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Correlates a `Reply` with its `Call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireValue {
    /// Plain serialized data.
    Data(serde_json::Value),
    /// An object living in the sender's table.
    Proxy(ProxyId),
    /// A value produced by a named transfer handler.
    Handled {
        handler: String,
        value: Box<WireValue>,
    },
}

impl WireValue {
    pub fn unit() -> Self {
        Self::Data(serde_json::Value::Null)
    }

    pub fn data<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Data)
    }

    /// Decode a `Data` payload. Any other shape fails with a serde error.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match self {
            Self::Data(value) => T::deserialize(value),
            other => Err(serde::de::Error::custom(format!(
                "expected data, found {}",
                other.kind()
            ))),
        }
    }

    pub fn as_proxy(&self) -> Option<ProxyId> {
        match self {
            Self::Proxy(id) => Some(*id),
            _ => None,
        }
    }

    /// Name of the transfer handler that produced this value, if any.
    pub fn handler(&self) -> Option<&str> {
        match self {
            Self::Handled { handler, .. } => Some(handler),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Proxy(_) => "proxy",
            Self::Handled { .. } => "handled value",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireMessage {
    /// Invoke `method` on `target` and expect a `Reply`.
    Call {
        id: CallId,
        target: ProxyId,
        method: String,
        args: Vec<WireValue>,
    },
    /// Invoke `method` on `target` without a reply.
    Notify {
        target: ProxyId,
        method: String,
        args: Vec<WireValue>,
    },
    Reply {
        id: CallId,
        result: Result<WireValue, RemoteFault>,
    },
    /// The peer dropped its last reference to `target`.
    Release { target: ProxyId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    UnknownTarget,
    UnknownMethod,
    BadArguments,
    Failed,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTarget => write!(f, "unknown target"),
            Self::UnknownMethod => write!(f, "unknown method"),
            Self::BadArguments => write!(f, "bad arguments"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Error value carried back by a `Reply`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct RemoteFault {
    pub kind: FaultKind,
    pub message: String,
}

impl RemoteFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_target(target: ProxyId) -> Self {
        Self::new(FaultKind::UnknownTarget, format!("no object {target}"))
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(FaultKind::UnknownMethod, method)
    }

    pub fn bad_arguments(message: impl fmt::Display) -> Self {
        Self::new(FaultKind::BadArguments, message.to_string())
    }
}

impl From<serde_json::Error> for RemoteFault {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_arguments(err)
    }
}
