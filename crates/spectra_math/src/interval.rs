use std::ops::RangeInclusive;

/// Scalar range `[min, max]`.
///
/// Rays keep their admissible hit distances in one, and the bounding box
/// stores one per axis. An interval with `min > max` (or a NaN bound) is
/// empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Default for Interval {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<RangeInclusive<f32>> for Interval {
    fn from(range: RangeInclusive<f32>) -> Self {
        let (min, max) = range.into_inner();
        Self { min, max }
    }
}

impl Interval {
    pub const EMPTY: Self = Self::new(f32::INFINITY, f32::NEG_INFINITY);
    pub const UNIVERSE: Self = Self::new(f32::NEG_INFINITY, f32::INFINITY);

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Length of the range. Negative for empty intervals.
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    pub fn is_empty(&self) -> bool {
        // Written this way so NaN bounds count as empty
        !(self.min <= self.max)
    }

    /// Closed membership test.
    pub fn contains(&self, v: f32) -> bool {
        (self.min..=self.max).contains(&v)
    }

    /// Open membership test. Hit distances equal to either bound are rejected.
    pub fn surrounds(&self, v: f32) -> bool {
        v > self.min && v < self.max
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.max(self.min).min(self.max)
    }

    pub fn with_max(self, max: f32) -> Self {
        Self { max, ..self }
    }

    /// Grows both ends by half of `amount`.
    pub fn padded(&self, amount: f32) -> Self {
        let half = 0.5 * amount;
        Self::new(self.min - half, self.max + half)
    }

    /// Smallest interval covering both inputs.
    pub fn hull(a: &Self, b: &Self) -> Self {
        Self::new(a.min.min(b.min), a.max.max(b.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_and_open_membership() {
        let range = Interval::from(0.0..=10.0);
        assert!(range.contains(0.0) && range.contains(10.0));
        assert!(!range.surrounds(0.0) && !range.surrounds(10.0));
        assert!(range.surrounds(9.9));
        assert!(!range.contains(10.1));
    }

    #[test]
    fn test_with_max_keeps_lower_bound() {
        let shrunk = Interval::new(1e-4, f32::INFINITY).with_max(4.0);
        assert_eq!(shrunk, Interval::new(1e-4, 4.0));
        assert_eq!(shrunk.clamp(9.0), 4.0);
    }

    #[test]
    fn test_padded_and_hull() {
        assert_eq!(Interval::new(0.0, 10.0).padded(4.0), Interval::new(-2.0, 12.0));
        let hull = Interval::hull(&Interval::new(2.0, 3.0), &Interval::new(-1.0, 0.5));
        assert_eq!(hull, Interval::new(-1.0, 3.0));
        assert_eq!(Interval::hull(&Interval::EMPTY, &hull), hull);
    }

    #[test]
    fn test_empty_intervals() {
        assert!(Interval::default().is_empty());
        assert!(!Interval::EMPTY.contains(0.0));
        assert!(!Interval::UNIVERSE.is_empty());
        assert!(Interval::new(f32::NAN, 1.0).is_empty());
    }
}
