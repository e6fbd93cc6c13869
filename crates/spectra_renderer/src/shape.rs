//! Shape trait for local-space ray-geometry intersection.
//!
//! Shapes know nothing about placement or shading. A [`crate::Primitive`]
//! moves rays into the shape's local space and the hit back out.

use crate::{Ray, Sampler};
use spectra_math::{Aabb, Vec2, Vec3};

/// Local-space intersection produced by a [`Shape`].
#[derive(Debug, Clone, Copy)]
pub struct ShapeHit {
    /// Ray parameter of the hit
    pub t: f32,
    pub position: Vec3,
    /// Outward unit normal
    pub normal: Vec3,
    pub uv: Vec2,
    /// Surface derivative along `u`, used to orient the tangent frame.
    /// May be zero (e.g. at a sphere pole).
    pub dpdu: Vec3,
}

/// A point drawn uniformly over a shape's surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub position: Vec3,
    pub normal: Vec3,
    /// Density with respect to surface area
    pub pdf: f32,
}

/// Geometry defined in its own local coordinate system.
pub trait Shape: Send + Sync {
    /// Nearest hit strictly inside the ray's interval, if any.
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit>;

    /// Surface area in local units.
    fn area(&self) -> f32;

    /// Local-space bounds.
    fn bounds(&self) -> Aabb;

    /// Uniformly sample a point on the surface.
    fn sample_point(&self, sampler: &mut dyn Sampler) -> SurfaceSample;
}
