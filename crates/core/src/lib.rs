pub mod context;
pub mod coords;
pub mod error;
pub mod host;
pub mod layout;
pub mod model;
pub mod stream;

pub use context::{GraphContext, ViewportHosts};
pub use coords::{BpRange, CoordinateSystem, SegmentId, SegmentTable};
pub use error::ViewError;
pub use host::ViewportHost;
pub use layout::PointSequence;
pub use model::{LinearView, MutationOutcome, RejectReason, SpatialView, ViewModel};
pub use stream::{Observable, Observer, PushChannel, StreamError, Subscription};
