//! Read-only bridge between base-pair space and graph segments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Half-open base-pair range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpRange {
    pub start: i64,
    pub end: i64,
}

impl BpRange {
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// The coordinate system of one graph context.
///
/// Implementations are owned elsewhere; this crate only reads them.
pub trait CoordinateSystem: Send + Sync {
    /// Total extent in base pairs.
    fn max_extent(&self) -> i64;

    fn segment_at_position(&self, bp: i64) -> Option<SegmentId>;

    fn segment_range(&self, segment: SegmentId) -> Option<BpRange>;

    fn segment_offset(&self, segment: SegmentId) -> Option<i64> {
        self.segment_range(segment).map(|range| range.start)
    }
}

/// Segments laid end to end in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    /// `offsets[i]` is where segment `i` starts; the last entry is the total.
    offsets: Vec<i64>,
}

impl SegmentTable {
    pub fn from_lengths(lengths: impl IntoIterator<Item = u32>) -> Self {
        let mut offsets = vec![0];
        let mut total = 0i64;
        for len in lengths {
            total += i64::from(len);
            offsets.push(total);
        }
        Self { offsets }
    }

    pub fn segment_count(&self) -> usize {
        self.offsets.len() - 1
    }
}

impl CoordinateSystem for SegmentTable {
    fn max_extent(&self) -> i64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    fn segment_at_position(&self, bp: i64) -> Option<SegmentId> {
        if bp < 0 || bp >= self.max_extent() {
            return None;
        }
        // Last offset <= bp; skips zero-length segments.
        let idx = self.offsets.partition_point(|&offset| offset <= bp) - 1;
        u32::try_from(idx).ok().map(SegmentId)
    }

    fn segment_range(&self, segment: SegmentId) -> Option<BpRange> {
        let idx = segment.0 as usize;
        let start = *self.offsets.get(idx)?;
        let end = *self.offsets.get(idx + 1)?;
        Some(BpRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_position() {
        let table = SegmentTable::from_lengths([10, 0, 5, 20]);
        assert_eq!(table.segment_count(), 4);
        assert_eq!(table.max_extent(), 35);
        assert_eq!(table.segment_at_position(0), Some(SegmentId(0)));
        assert_eq!(table.segment_at_position(9), Some(SegmentId(0)));
        assert_eq!(table.segment_at_position(10), Some(SegmentId(2)));
        assert_eq!(table.segment_at_position(15), Some(SegmentId(3)));
        assert_eq!(table.segment_at_position(35), None);
        assert_eq!(table.segment_at_position(-1), None);
    }

    #[test]
    fn ranges_and_offsets() {
        let table = SegmentTable::from_lengths([10, 5]);
        assert_eq!(
            table.segment_range(SegmentId(1)),
            Some(BpRange { start: 10, end: 15 })
        );
        assert_eq!(table.segment_offset(SegmentId(1)), Some(10));
        assert_eq!(table.segment_range(SegmentId(2)), None);
    }
}
