pub mod commands;
pub mod gesture;
pub mod snapshot;
pub mod theme;
pub mod types;
pub mod wire;

pub use commands::{RenderCommand, TextAlign};
pub use gesture::{CenterGesture, DragGesture, SpatialZoomGesture, ZoomGesture};
pub use snapshot::{LinearSnapshot, MalformedSnapshot, SpatialSnapshot, Validate};
pub use theme::ThemeToken;
pub use types::{Point, Rect, Size};
pub use wire::{CallId, FaultKind, ProxyId, RemoteFault, WireMessage, WireValue};
