use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs of the consumer side. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Period of the shared frame scheduler.
    pub frame_interval_ms: u64,
    pub path_throttle_ms: u64,
    pub overview_throttle_ms: u64,
    pub sequence_throttle_ms: u64,
    /// Period of the canvas's own frame loop.
    pub canvas_frame_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            path_throttle_ms: 16,
            overview_throttle_ms: 50,
            sequence_throttle_ms: 30,
            canvas_frame_ms: 33,
        }
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn path_throttle(&self) -> Duration {
        Duration::from_millis(self.path_throttle_ms)
    }

    pub fn overview_throttle(&self) -> Duration {
        Duration::from_millis(self.overview_throttle_ms)
    }

    pub fn sequence_throttle(&self) -> Duration {
        Duration::from_millis(self.sequence_throttle_ms)
    }

    pub fn canvas_frame(&self) -> Duration {
        Duration::from_millis(self.canvas_frame_ms.max(1))
    }
}
