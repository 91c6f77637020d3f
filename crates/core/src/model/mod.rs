pub mod linear;
pub mod spatial;

use serde::{Deserialize, Serialize};

pub use linear::LinearView;
pub use spatial::SpatialView;

/// What a mutation did to its view model.
///
/// Clamping is not an error: the result is deterministic, and re-applying
/// the clamped value leaves the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationOutcome {
    /// The requested state was applied verbatim.
    Applied,
    /// The request was adjusted to satisfy the view's invariants.
    Clamped,
    /// The request was refused; the prior state is retained.
    Rejected(RejectReason),
}

impl MutationOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// `end <= start`.
    EmptyRange,
    /// An input or derived value was NaN or infinite.
    NonFinite,
    /// A scale or size was zero or negative.
    NonPositive,
    /// Integer arithmetic on the range would overflow.
    Overflow,
}

/// A view model the host can snapshot.
pub trait ViewModel {
    type Snapshot: Clone + PartialEq + 'static;

    fn snapshot(&self) -> Self::Snapshot;
}
