use bpview_protocol::{Point, Rect};

/// Owned buffer of 2D layout positions.
///
/// Iteration is finite and can be restarted as often as needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSequence {
    points: Vec<Point>,
}

impl PointSequence {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    /// Smallest rectangle holding every finite point.
    pub fn bounds(&self) -> Option<Rect> {
        let mut finite = self.points.iter().filter(|p| p.is_finite());
        let first = finite.next()?;
        let (mut min, mut max) = (*first, *first);
        for p in finite {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }
}

impl FromIterator<Point> for PointSequence {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointSequence {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_skip_non_finite() {
        let seq: PointSequence = [
            Point::new(1.0, 2.0),
            Point::new(f64::NAN, 100.0),
            Point::new(-3.0, 8.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(seq.bounds(), Some(Rect::new(-3.0, 2.0, 4.0, 6.0)));
        assert_eq!(PointSequence::default().bounds(), None);
    }

    #[test]
    fn iteration_restarts() {
        let seq = PointSequence::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(seq.iter().count(), 2);
        assert_eq!((&seq).into_iter().count(), 2);
    }
}
