//! Sphere shape centered at the local origin.

use crate::shape::{Shape, ShapeHit, SurfaceSample};
use crate::{Ray, Sampler};
use spectra_math::sampling::uniform_sample_sphere;
use spectra_math::{Aabb, Vec2, Vec3};
use std::f32::consts::PI;

/// A sphere of the given radius around the local origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(radius: f32) -> Self {
        assert!(radius > 0.0, "sphere radius must be positive");
        Self { radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Spherical UV for a point on the sphere.
    ///
    /// phi: angle around Y from +X toward +Z, theta: angle down from +Y.
    fn sphere_uv(&self, p: Vec3) -> Vec2 {
        let mut phi = p.z.atan2(p.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        let theta = (p.y / self.radius).clamp(-1.0, 1.0).acos();
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }
}

/// Roots of `a t^2 + b t + c` in ascending order.
///
/// Uses `q = -(b + sign(b) sqrt(disc)) / 2` so neither root suffers
/// cancellation.
fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a == 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let q = if b < 0.0 {
        -0.5 * (b - root)
    } else {
        -0.5 * (b + root)
    };
    if q == 0.0 {
        return None;
    }
    let t0 = q / a;
    let t1 = c / q;
    Some(if t0 <= t1 { (t0, t1) } else { (t1, t0) })
}

impl Shape for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit> {
        let o = ray.origin();
        let d = ray.direction();
        let a = d.length_squared();
        let b = 2.0 * d.dot(o);
        let c = o.length_squared() - self.radius * self.radius;

        let (t0, t1) = solve_quadratic(a, b, c)?;

        // Find the nearest root in the acceptable range
        let range = ray.interval();
        let t = if range.surrounds(t0) {
            t0
        } else if range.surrounds(t1) {
            t1
        } else {
            return None;
        };

        let position = ray.at(t);
        let normal = position / self.radius;
        let dpdu = 2.0 * PI * Vec3::new(-position.z, 0.0, position.x);

        Some(ShapeHit {
            t,
            position,
            normal,
            uv: self.sphere_uv(position),
            dpdu,
        })
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    fn bounds(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(-r, r)
    }

    fn sample_point(&self, sampler: &mut dyn Sampler) -> SurfaceSample {
        let normal = uniform_sample_sphere(sampler.next_2d());
        SurfaceSample {
            position: normal * self.radius,
            normal,
            pdf: 1.0 / self.area(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PcgSampler;

    #[test]
    fn test_sphere_hit_from_outside() {
        let sphere = Sphere::new(1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 550.0);

        let hit = sphere.intersect(&ray).expect("ray should hit");
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!((hit.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_sphere_hit_from_inside_takes_far_root() {
        let sphere = Sphere::new(2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 550.0);

        let hit = sphere.intersect(&ray).expect("ray should hit");
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(0.5);

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z, 550.0);
        assert!(sphere.intersect(&ray).is_none());

        // Ray passing beside it
        let ray = Ray::new(Vec3::new(1.0, 0.0, -2.0), Vec3::Z, 550.0);
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_sphere_respects_tmax() {
        let sphere = Sphere::new(1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 550.0)
            .with_interval(spectra_math::Interval::new(0.0, 3.0));
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_stable_quadratic_for_distant_origin() {
        let sphere = Sphere::new(1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10_000.0), Vec3::Z, 550.0);
        let hit = sphere.intersect(&ray).expect("ray should hit");
        assert!((hit.t - 9_999.0).abs() < 1e-2);
    }

    #[test]
    fn test_uv_ranges() {
        let sphere = Sphere::new(1.0);
        let top = sphere.sphere_uv(Vec3::Y);
        let bottom = sphere.sphere_uv(-Vec3::Y);
        assert!(top.y.abs() < 1e-6);
        assert!((bottom.y - 1.0).abs() < 1e-6);
        let side = sphere.sphere_uv(-Vec3::Z);
        assert!((side.x - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_samples_lie_on_surface() {
        let sphere = Sphere::new(3.0);
        let mut sampler = PcgSampler::new(42);
        for _ in 0..256 {
            let s = sphere.sample_point(&mut sampler);
            assert!((s.position.length() - 3.0).abs() < 1e-4);
            assert!((s.normal - s.position / 3.0).length() < 1e-4);
            assert!((s.pdf * sphere.area() - 1.0).abs() < 1e-5);
        }
    }
}
