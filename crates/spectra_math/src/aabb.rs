use crate::{Interval, Vec3};

/// Thinnest extent a box is allowed to have along any axis.
const MIN_EXTENT: f32 = 1e-4;

/// Axis-aligned box stored as one [`Interval`] per axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Box spanned by two opposite corners, in any order.
    ///
    /// Flat boxes (a plane, an axis-aligned triangle) are thickened to
    /// [`MIN_EXTENT`] so the slab test never divides a zero-width slab.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let (lo, hi) = (a.min(b), a.max(b));
        let thicken = |i: Interval| {
            if i.size() < MIN_EXTENT {
                i.padded(MIN_EXTENT)
            } else {
                i
            }
        };
        Self {
            x: thicken(Interval::new(lo.x, hi.x)),
            y: thicken(Interval::new(lo.y, hi.y)),
            z: thicken(Interval::new(lo.z, hi.z)),
        }
    }

    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            x: Interval::hull(&a.x, &b.x),
            y: Interval::hull(&a.y, &b.y),
            z: Interval::hull(&a.z, &b.z),
        }
    }

    pub fn from_iter_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .map(|p| Aabb::from_points(p, p))
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b))
    }

    fn slab(&self, axis: usize) -> &Interval {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn centroid(&self) -> Vec3 {
        0.5 * (self.min() + self.max())
    }

    /// Corners indexed by bit pattern: bit 0 picks max x, bit 1 max y, bit 2 max z.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min(), self.max());
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            )
        })
    }

    /// Whether `origin + t * direction` enters the box for some `t` in `range`.
    pub fn hit(&self, origin: Vec3, direction: Vec3, range: Interval) -> bool {
        let (mut near, mut far) = (range.min, range.max);
        for axis in 0..3 {
            let slab = self.slab(axis);
            let inv = direction[axis].recip();
            let a = (slab.min - origin[axis]) * inv;
            let b = (slab.max - origin[axis]) * inv;
            let (enter, exit) = if inv < 0.0 { (b, a) } else { (a, b) };
            near = near.max(enter);
            far = far.min(exit);
            if far < near {
                return false;
            }
        }
        true
    }

    /// Axis (0 = x, 1 = y, 2 = z) along which the box is widest.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x > e.y && e.x > e.z {
            0
        } else if e.y > e.z {
            1
        } else {
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_order_does_not_matter() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(aabb.min(), Vec3::ZERO);
        assert_eq!(aabb.max(), Vec3::splat(10.0));
        assert_eq!(aabb.corners()[0], Vec3::ZERO);
        assert_eq!(aabb.corners()[7], Vec3::splat(10.0));
        assert_eq!(aabb.corners()[2], Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_flat_box_is_thickened() {
        let aabb = Aabb::from_points(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 0.0, 0.5));
        assert!(aabb.extent().y > 0.0);
        assert!(aabb.hit(Vec3::Y, Vec3::NEG_Y, Interval::new(0.0, 10.0)));
    }

    #[test]
    fn test_slab_hit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::ONE);
        let origin = Vec3::new(0.0, 0.0, -5.0);
        let range = Interval::new(0.0, 100.0);
        assert!(aabb.hit(origin, Vec3::Z, range));
        assert!(!aabb.hit(origin, Vec3::NEG_Z, range));
        assert!(!aabb.hit(Vec3::new(10.0, 0.0, 0.0), Vec3::Z, range));
        assert!(!aabb.hit(origin, Vec3::Z, Interval::new(0.0, 2.0)));
    }

    #[test]
    fn test_point_cloud_bounds() {
        let aabb = Aabb::from_iter_points([Vec3::ZERO, Vec3::new(10.0, 2.0, 4.0), Vec3::ONE]);
        assert!(aabb.centroid().abs_diff_eq(Vec3::new(5.0, 1.0, 2.0), 1e-4));
        assert_eq!(aabb.longest_axis(), 0);
        assert_eq!(Aabb::default(), Aabb::EMPTY);
    }
}
