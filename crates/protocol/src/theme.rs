use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Segment fills, cycled by segment id
    SegmentA,
    SegmentB,
    SegmentC,
    SegmentD,

    TrackBackground,
    TrackBorder,
    TrackHeaderText,

    TextPrimary,
    TextMuted,

    // Nucleotides
    BaseA,
    BaseC,
    BaseG,
    BaseT,
    BaseOther,

    // Overview map
    OverviewBackground,
    OverviewViewport,
    OverviewHandle,

    // 2D canvas
    CanvasBackground,
    CanvasNode,
    CanvasEdge,
}

impl ThemeToken {
    /// Fill token for a segment, cycled so neighbours differ.
    pub fn for_segment(id: u32) -> Self {
        match id % 4 {
            0 => Self::SegmentA,
            1 => Self::SegmentB,
            2 => Self::SegmentC,
            _ => Self::SegmentD,
        }
    }

    /// Fill token for a single nucleotide.
    pub fn for_base(base: u8) -> Self {
        match base.to_ascii_uppercase() {
            b'A' => Self::BaseA,
            b'C' => Self::BaseC,
            b'G' => Self::BaseG,
            b'T' => Self::BaseT,
            _ => Self::BaseOther,
        }
    }
}
