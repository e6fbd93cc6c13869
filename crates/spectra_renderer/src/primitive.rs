//! Primitives bind a shape to a material, an optional light and a transform.

use crate::shape::{Shape, SurfaceSample};
use crate::{Light, Material, Ray, Sampler};
use spectra_math::{Aabb, Frame, Vec2, Vec3};
use spectra_math::Transform;
use std::fmt;
use std::sync::Arc;

/// Record of the nearest ray-primitive intersection found so far.
#[derive(Clone, Copy)]
pub struct IntersectInfo<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// World-space hit point
    pub position: Vec3,
    /// World-space outward unit normal
    pub normal: Vec3,
    /// Shading frame around `normal`
    pub frame: Frame,
    /// UV texture coordinates
    pub uv: Vec2,
    /// The primitive that was hit
    pub primitive: Option<&'a Primitive>,
}

impl Default for IntersectInfo<'_> {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            position: Vec3::ZERO,
            normal: Vec3::Y,
            frame: Frame {
                tangent: Vec3::X,
                normal: Vec3::Y,
                bitangent: Vec3::Z,
            },
            uv: Vec2::ZERO,
            primitive: None,
        }
    }
}

impl fmt::Debug for IntersectInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntersectInfo")
            .field("t", &self.t)
            .field("position", &self.position)
            .field("normal", &self.normal)
            .field("uv", &self.uv)
            .field("hit", &self.primitive.is_some())
            .finish()
    }
}

/// A placed, shaded piece of geometry.
pub struct Primitive {
    shape: Arc<dyn Shape>,
    material: Arc<dyn Material>,
    light: Option<Arc<dyn Light>>,
    transform: Transform,
    bounds: Aabb,
}

impl Primitive {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn Material>, transform: Transform) -> Self {
        let bounds = transform.apply_aabb(&shape.bounds());
        Self {
            shape,
            material,
            light: None,
            transform,
            bounds,
        }
    }

    /// Make this primitive emissive.
    pub fn with_light(mut self, light: Arc<dyn Light>) -> Self {
        self.light = Some(light);
        self
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    pub fn light(&self) -> Option<&dyn Light> {
        self.light.as_deref()
    }

    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Intersect a world-space ray, overwriting `info` only on a hit.
    pub fn intersect<'a>(&'a self, ray: &Ray, info: &mut IntersectInfo<'a>) -> bool {
        let local = ray.to_local(&self.transform);
        let Some(hit) = self.shape.intersect(&local) else {
            return false;
        };

        let normal = self.transform.apply_normal(hit.normal).normalize();
        let dpdu = self.transform.apply_direction(hit.dpdu);

        info.t = hit.t;
        info.position = self.transform.apply_point(hit.position);
        info.normal = normal;
        info.frame = Frame::from_normal_tangent(normal, dpdu);
        info.uv = hit.uv;
        info.primitive = Some(self);
        true
    }

    /// Uniformly sample a world-space point; `pdf` is per unit world area.
    pub fn sample_point(&self, sampler: &mut dyn Sampler) -> SurfaceSample {
        let local = self.shape.sample_point(sampler);
        SurfaceSample {
            position: self.transform.apply_point(local.position),
            normal: self.transform.apply_normal(local.normal).normalize(),
            pdf: local.pdf / self.transform.area_scale(local.normal),
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("bounds", &self.bounds)
            .field("is_light", &self.is_light())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AreaLight, Diffuse, PcgSampler, Plane, Spd, Sphere};
    use spectra_math::Quat;

    fn grey() -> Arc<dyn Material> {
        Arc::new(Diffuse::new(Spd::constant(0.5)))
    }

    #[test]
    fn test_intersect_fills_record() {
        let prim = Primitive::new(
            Arc::new(Sphere::new(1.0)),
            grey(),
            Transform::from_translation(Vec3::new(0.0, 0.0, -3.0)),
        );
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z, 550.0);
        let mut info = IntersectInfo::default();

        assert!(prim.intersect(&ray, &mut info));
        assert!((info.t - 2.0).abs() < 1e-5);
        assert!((info.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
        assert!((info.normal - Vec3::Z).length() < 1e-5);
        assert!(std::ptr::eq(info.primitive.unwrap(), &prim));
        assert!((info.frame.normal - info.normal).length() < 1e-5);
    }

    #[test]
    fn test_scaled_shape_keeps_world_t() {
        // A sphere of radius 1 scaled by 2 behaves like a radius 2 sphere
        let prim = Primitive::new(
            Arc::new(Sphere::new(1.0)),
            grey(),
            Transform::from_translation(Vec3::new(0.0, 0.0, -10.0))
                * Transform::from_scale(Vec3::splat(2.0)),
        );
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z, 550.0);
        let mut info = IntersectInfo::default();

        assert!(prim.intersect(&ray, &mut info));
        assert!((info.t - 8.0).abs() < 1e-4);
        assert!((info.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_non_uniform_scale_normal() {
        // Plane tilted 45 degrees around X then stretched along Z
        let transform = Transform::from_scale(Vec3::new(1.0, 1.0, 4.0))
            * Transform::from_scale_rotation_translation(
                Vec3::ONE,
                Quat::from_rotation_x(std::f32::consts::FRAC_PI_4),
                Vec3::ZERO,
            );
        let prim = Primitive::new(Arc::new(Plane::new()), grey(), transform);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, 550.0);
        let mut info = IntersectInfo::default();

        assert!(prim.intersect(&ray, &mut info));
        // The world normal stays perpendicular to the world surface
        let surface_dir = transform.apply_direction(Vec3::Z);
        assert!(info.normal.dot(surface_dir).abs() < 1e-4);
    }

    #[test]
    fn test_miss_leaves_record_untouched() {
        let prim = Primitive::new(Arc::new(Sphere::new(1.0)), grey(), Transform::IDENTITY);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, 550.0);
        let mut info = IntersectInfo::default();

        assert!(!prim.intersect(&ray, &mut info));
        assert_eq!(info.t, f32::INFINITY);
        assert!(info.primitive.is_none());
    }

    #[test]
    fn test_world_sample_pdf_uses_area_scale() {
        let prim = Primitive::new(
            Arc::new(Plane::new()),
            grey(),
            Transform::from_scale(Vec3::new(2.0, 1.0, 3.0)),
        )
        .with_light(Arc::new(AreaLight::new(Spd::constant(1.0))));
        let mut sampler = PcgSampler::new(42);

        assert!(prim.is_light());
        let s = prim.sample_point(&mut sampler);
        assert!((s.pdf - 1.0 / 6.0).abs() < 1e-5);
        assert!((s.normal - Vec3::Y).length() < 1e-5);
        assert!(s.position.x.abs() <= 1.0 && s.position.z.abs() <= 1.5);
    }
}
