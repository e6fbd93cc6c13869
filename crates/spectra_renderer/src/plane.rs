//! Unit square in the local XZ plane.

use crate::shape::{Shape, ShapeHit, SurfaceSample};
use crate::{Ray, Sampler};
use spectra_math::{Aabb, Vec2, Vec3};

/// A 1x1 square centered at the origin at `y = 0` with normal `+Y`.
///
/// Size and placement come from the primitive's transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plane;

impl Plane {
    pub fn new() -> Self {
        Self
    }
}

impl Shape for Plane {
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit> {
        let o = ray.origin();
        let d = ray.direction();
        if d.y == 0.0 {
            return None;
        }

        let t = -o.y / d.y;
        if !ray.interval().surrounds(t) {
            return None;
        }

        let p = ray.at(t);
        if p.x.abs() > 0.5 || p.z.abs() > 0.5 {
            return None;
        }

        Some(ShapeHit {
            t,
            position: Vec3::new(p.x, 0.0, p.z),
            normal: Vec3::Y,
            uv: Vec2::new(p.x + 0.5, p.z + 0.5),
            dpdu: Vec3::X,
        })
    }

    fn area(&self) -> f32 {
        1.0
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_points(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 0.0, 0.5))
    }

    fn sample_point(&self, sampler: &mut dyn Sampler) -> SurfaceSample {
        let u = sampler.next_2d();
        SurfaceSample {
            position: Vec3::new(u.x - 0.5, 0.0, u.y - 0.5),
            normal: Vec3::Y,
            pdf: 1.0,
        }
    }
}
