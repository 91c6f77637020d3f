use std::fmt;
use std::sync::Arc;

use bpview_protocol::{Point, Size};

use crate::coords::CoordinateSystem;
use crate::error::ViewError;
use crate::host::ViewportHost;
use crate::layout::PointSequence;
use crate::model::{LinearView, SpatialView};

/// Spare room around the layout when the camera first frames it.
pub const FIT_MARGIN: f64 = 0.05;

/// Everything a graph's viewers share, built once by the application root
/// and handed to each constructor that needs it.
///
/// Cloning is cheap; the data behind it is immutable.
#[derive(Clone)]
pub struct GraphContext {
    coords: Arc<dyn CoordinateSystem>,
    layout: Arc<PointSequence>,
    sequence: Option<Arc<[u8]>>,
}

impl GraphContext {
    pub fn new(coords: Arc<dyn CoordinateSystem>, layout: PointSequence) -> Self {
        Self {
            coords,
            layout: Arc::new(layout),
            sequence: None,
        }
    }

    /// Attach the base sequence, indexed by base-pair position.
    pub fn with_sequence(mut self, sequence: impl Into<Arc<[u8]>>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    pub fn coords(&self) -> &Arc<dyn CoordinateSystem> {
        &self.coords
    }

    pub fn layout(&self) -> &Arc<PointSequence> {
        &self.layout
    }

    pub fn sequence(&self) -> Option<&Arc<[u8]>> {
        self.sequence.as_ref()
    }

    pub fn max_extent(&self) -> i64 {
        self.coords.max_extent()
    }
}

impl fmt::Debug for GraphContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphContext")
            .field("max_extent", &self.coords.max_extent())
            .field("layout_points", &self.layout.len())
            .field("sequence_len", &self.sequence.as_ref().map(|s| s.len()))
            .finish()
    }
}

/// The two hosts of one graph context.
pub struct ViewportHosts {
    pub linear: ViewportHost<LinearView>,
    pub spatial: ViewportHost<SpatialView>,
}

impl ViewportHosts {
    /// Linear view over the full extent; camera framing the whole layout.
    pub fn new(context: &GraphContext) -> Result<Self, ViewError> {
        let linear = LinearView::new(context.max_extent())?;
        let spatial = match context.layout().bounds() {
            Some(bounds) => SpatialView::fitted(bounds, FIT_MARGIN)?,
            None => SpatialView::new(Point::new(0.0, 0.0), Size::new(1.0, 1.0))?,
        };
        Ok(Self {
            linear: ViewportHost::new("linear", linear),
            spatial: ViewportHost::new("spatial", spatial),
        })
    }
}
