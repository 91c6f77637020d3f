//! A seeded synthetic graph so the viewer has something to show.

use std::sync::Arc;

use bpview_core::{GraphContext, PointSequence, SegmentTable};
use bpview_protocol::Point;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::DemoConfig;

const BASES: &[u8; 4] = b"ACGT";

/// Segments of random length laid out as a meandering 2D path, with a
/// random base sequence when the total extent is small enough. The same
/// config always builds the same graph.
pub fn build(config: &DemoConfig) -> GraphContext {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (lo, hi) = if config.min_segment_bp <= config.max_segment_bp {
        (config.min_segment_bp.max(1), config.max_segment_bp.max(1))
    } else {
        (config.max_segment_bp.max(1), config.min_segment_bp.max(1))
    };

    let lengths: Vec<u32> = (0..config.segments)
        .map(|_| rng.gen_range(lo..=hi))
        .collect();
    let total: u64 = lengths.iter().map(|&len| u64::from(len)).sum();

    let mut heading = 0.0f64;
    let mut at = Point::new(0.0, 0.0);
    let mut points = Vec::with_capacity(lengths.len());
    for &len in &lengths {
        points.push(at);
        heading += rng.gen_range(-0.6..0.6);
        let step = 1.0 + f64::from(len).log10();
        at = Point::new(at.x + heading.cos() * step, at.y + heading.sin() * step);
    }

    let coords = Arc::new(SegmentTable::from_lengths(lengths));
    let context = GraphContext::new(coords, PointSequence::new(points));
    if total > 0 && total <= config.max_sequence_bp {
        let sequence: Vec<u8> = (0..total).map(|_| BASES[rng.gen_range(0..BASES.len())]).collect();
        context.with_sequence(sequence)
    } else {
        context
    }
}
