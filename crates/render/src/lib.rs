pub mod config;
pub mod consumer;
pub mod operators;
pub mod scheduler;
pub mod sink;
pub mod surfaces;

pub use config::RenderConfig;
pub use consumer::{Surface, SurfaceConsumer, validated};
pub use operators::{distinct_until_changed, filter, throttle_latest};
pub use scheduler::{FrameKey, FrameScheduler};
pub use sink::{Frame, RecordingSink, RenderSink};
pub use surfaces::{CanvasLoop, CanvasView, OverviewMap, PathView, SequenceTrack};
