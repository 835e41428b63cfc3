//! Compact set of board points.
//!
//! One bit per square, bit 0 = a1 ... bit 63 = h8, matching [`Point::index`].

use chess_core::Point;
use std::fmt;

/// A set of points stored as a 64-bit mask.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PointSet(u64);

impl PointSet {
    /// Empty set.
    pub const EMPTY: PointSet = PointSet(0);

    /// Creates a set holding a single point.
    #[inline]
    pub const fn single(point: Point) -> Self {
        PointSet(1u64 << point.index())
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of points in the set.
    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn contains(self, point: Point) -> bool {
        self.0 & (1u64 << point.index()) != 0
    }

    #[inline]
    pub fn insert(&mut self, point: Point) {
        self.0 |= 1u64 << point.index();
    }

    #[inline]
    pub fn remove(&mut self, point: Point) {
        self.0 &= !(1u64 << point.index());
    }

    /// Returns the point with the lowest index.
    #[inline]
    pub fn first(self) -> Option<Point> {
        if self.0 == 0 {
            None
        } else {
            Point::from_index(self.0.trailing_zeros() as u8)
        }
    }

    /// Keeps only the points accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(Point) -> bool) {
        for point in *self {
            if !keep(point) {
                self.remove(point);
            }
        }
    }

    #[inline]
    pub fn iter(self) -> PointSetIter {
        PointSetIter(self.0)
    }
}

impl IntoIterator for PointSet {
    type Item = Point;
    type IntoIter = PointSetIter;

    fn into_iter(self) -> Self::IntoIter {
        PointSetIter(self.0)
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = PointSet::EMPTY;
        for point in iter {
            set.insert(point);
        }
        set
    }
}

/// Iterator over the points of a [`PointSet`], lowest index first.
pub struct PointSetIter(u64);

impl Iterator for PointSetIter {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Point::from_index(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for PointSetIter {}

impl fmt::Debug for PointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Point {
        Point::parse(s).unwrap()
    }

    #[test]
    fn insert_contains_remove() {
        let mut set = PointSet::EMPTY;
        assert!(set.is_empty());
        set.insert(p("e4"));
        set.insert(p("a1"));
        set.insert(p("e4"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(p("e4")));
        assert!(!set.contains(p("e5")));
        set.remove(p("e4"));
        assert_eq!(set, PointSet::single(p("a1")));
    }

    #[test]
    fn iterates_in_index_order() {
        let set: PointSet = [p("h8"), p("a1"), p("e4")].into_iter().collect();
        let points: Vec<Point> = set.iter().collect();
        assert_eq!(points, vec![p("a1"), p("e4"), p("h8")]);
        assert_eq!(set.first(), Some(p("a1")));
        assert_eq!(PointSet::EMPTY.first(), None);
    }

    #[test]
    fn retain_filters() {
        let mut set: PointSet = [p("e2"), p("e3"), p("e4")].into_iter().collect();
        set.retain(|point| point.row() > 1);
        assert_eq!(set.len(), 2);
        assert!(!set.contains(p("e2")));
    }
}
