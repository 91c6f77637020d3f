use std::cell::RefCell;

use bpview_protocol::RenderCommand;

/// Receives each finished command list, one per surface redraw.
pub trait RenderSink {
    fn present(&self, surface: &'static str, commands: Vec<RenderCommand>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub surface: &'static str,
    pub commands: Vec<RenderCommand>,
}

/// Sink that keeps every presented frame, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    frames: RefCell<Vec<Frame>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.borrow().clone()
    }

    /// Number of redraws presented by `surface`.
    pub fn count(&self, surface: &str) -> usize {
        self.frames
            .borrow()
            .iter()
            .filter(|frame| frame.surface == surface)
            .count()
    }

    pub fn last(&self, surface: &str) -> Option<Vec<RenderCommand>> {
        self.frames
            .borrow()
            .iter()
            .rev()
            .find(|frame| frame.surface == surface)
            .map(|frame| frame.commands.clone())
    }

    pub fn clear(&self) {
        self.frames.borrow_mut().clear();
    }
}

impl RenderSink for RecordingSink {
    fn present(&self, surface: &'static str, commands: Vec<RenderCommand>) {
        self.frames.borrow_mut().push(Frame { surface, commands });
    }
}
