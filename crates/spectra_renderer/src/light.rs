//! Emitters attached to primitives.
//!
//! Points on a light are sampled through [`crate::Primitive::sample_point`];
//! a light only answers how much radiance leaves its surface.

use crate::{IntersectInfo, Ray, Spd};

/// Radiance emitted by a surface.
pub trait Light: Send + Sync {
    /// Radiance leaving the hit point back along `ray`, at the ray's wavelength.
    fn le(&self, ray: &Ray, hit: &IntersectInfo) -> f32;
}

/// Diffuse area emitter.
#[derive(Debug, Clone)]
pub struct AreaLight {
    emission: Spd,
    scale: f32,
    two_sided: bool,
}

impl AreaLight {
    /// One-sided emitter radiating on the side of the outward normal.
    pub fn new(emission: Spd) -> Self {
        Self {
            emission,
            scale: 1.0,
            two_sided: false,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    pub fn emission(&self) -> &Spd {
        &self.emission
    }
}

impl Light for AreaLight {
    fn le(&self, ray: &Ray, hit: &IntersectInfo) -> f32 {
        if !self.two_sided && ray.direction().dot(hit.normal) >= 0.0 {
            return 0.0;
        }
        self.emission.sample(ray.lambda()) * self.scale
    }
}
