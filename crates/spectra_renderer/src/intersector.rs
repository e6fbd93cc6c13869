//! Nearest-hit queries over a set of primitives.

use crate::{IntersectInfo, Primitive, Ray};
use std::sync::Arc;

/// Answers nearest-hit queries against a fixed set of primitives.
pub trait Intersector: Send + Sync {
    /// Find the nearest hit inside the ray's `[tmin, tmax]`.
    ///
    /// Returns true if hit, and fills in `info`.
    fn intersect<'a>(&'a self, ray: &Ray, info: &mut IntersectInfo<'a>) -> bool;

    /// All primitives, in insertion order.
    fn primitives(&self) -> &[Arc<Primitive>];
}

/// Reference intersector: tests every primitive.
#[derive(Debug, Default)]
pub struct LinearIntersector {
    primitives: Vec<Arc<Primitive>>,
}

impl LinearIntersector {
    pub fn new(primitives: Vec<Arc<Primitive>>) -> Self {
        Self { primitives }
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Intersector for LinearIntersector {
    fn intersect<'a>(&'a self, ray: &Ray, info: &mut IntersectInfo<'a>) -> bool {
        let mut ray = *ray;
        let mut hit_anything = false;

        for primitive in &self.primitives {
            if primitive.intersect(&ray, info) {
                hit_anything = true;
                ray = ray.with_interval(ray.interval().with_max(info.t));
            }
        }

        hit_anything
    }

    fn primitives(&self) -> &[Arc<Primitive>] {
        &self.primitives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Diffuse, Material, Spd, Sphere};
    use spectra_math::{Interval, Transform, Vec3};

    fn sphere_at(z: f32) -> Arc<Primitive> {
        let material: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::constant(0.5)));
        Arc::new(Primitive::new(
            Arc::new(Sphere::new(0.5)),
            material,
            Transform::from_translation(Vec3::new(0.0, 0.0, z)),
        ))
    }

    #[test]
    fn test_linear_returns_nearest() {
        let intersector = LinearIntersector::new(vec![sphere_at(-10.0), sphere_at(-3.0), sphere_at(-6.0)]);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z, 550.0);
        let mut info = IntersectInfo::default();

        assert!(intersector.intersect(&ray, &mut info));
        assert!((info.t - 2.5).abs() < 1e-5);
        assert!(std::ptr::eq(info.primitive.unwrap(), intersector.primitives()[1].as_ref()));
    }

    #[test]
    fn test_linear_respects_interval() {
        let intersector = LinearIntersector::new(vec![sphere_at(-3.0), sphere_at(-6.0)]);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z, 550.0).with_interval(Interval::new(4.0, 100.0));
        let mut info = IntersectInfo::default();

        assert!(intersector.intersect(&ray, &mut info));
        assert!((info.t - 5.5).abs() < 1e-5);

        let short = Ray::new(Vec3::ZERO, -Vec3::Z, 550.0).with_interval(Interval::new(0.0, 1.0));
        let mut info = IntersectInfo::default();
        assert!(!intersector.intersect(&short, &mut info));
    }

    #[test]
    fn test_empty_intersector_misses() {
        let intersector = LinearIntersector::default();
        let mut info = IntersectInfo::default();
        assert!(intersector.is_empty());
        assert!(!intersector.intersect(&Ray::new(Vec3::ZERO, Vec3::X, 550.0), &mut info));
    }
}
