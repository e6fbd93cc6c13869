//! Material trait for surface scattering.
//!
//! Materials work in the local shading frame where +Y is the surface normal.
//! `wo` points away from the surface toward the previous path vertex, and
//! the sampled `wi` points away from the surface toward the next one.
//! Everything is evaluated at a single wavelength.

use crate::{Sampler, Spd};
use spectra_math::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};
use spectra_math::Vec3;
use std::f32::consts::FRAC_1_PI;

/// A sampled incident direction and its BSDF value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    pub wi: Vec3,
    /// BSDF value at the sampled wavelength
    pub f: f32,
    /// Density of `wi`; 1 for delta lobes
    pub pdf: f32,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Sample an incident direction for the outgoing direction `wo`.
    ///
    /// Returns `None` if the path is absorbed.
    fn sample_direction(&self, wo: Vec3, lambda: f32, sampler: &mut dyn Sampler) -> Option<BsdfSample>;

    /// BSDF value for a pair of directions. Zero for delta lobes.
    fn eval(&self, wo: Vec3, wi: Vec3, lambda: f32) -> f32;

    /// True for perfectly specular materials (mirror, glass).
    fn is_delta(&self) -> bool {
        false
    }
}

#[inline]
fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
    a.y * b.y > 0.0
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Diffuse {
    albedo: Spd,
}

impl Diffuse {
    /// Create a new Lambertian material with the given albedo spectrum.
    pub fn new(albedo: Spd) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> &Spd {
        &self.albedo
    }
}

impl Material for Diffuse {
    fn sample_direction(&self, wo: Vec3, lambda: f32, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let mut wi = cosine_sample_hemisphere(sampler.next_2d());
        // Scatter on the side the path arrived from
        if wo.y < 0.0 {
            wi.y = -wi.y;
        }
        let pdf = cosine_hemisphere_pdf(wi.y.abs());
        if pdf <= 0.0 {
            return None;
        }
        Some(BsdfSample {
            wi,
            f: self.albedo.sample(lambda) * FRAC_1_PI,
            pdf,
        })
    }

    fn eval(&self, wo: Vec3, wi: Vec3, lambda: f32) -> f32 {
        if same_hemisphere(wo, wi) {
            self.albedo.sample(lambda) * FRAC_1_PI
        } else {
            0.0
        }
    }
}

/// Perfect mirror.
#[derive(Debug, Clone)]
pub struct Mirror {
    reflectance: Spd,
}

impl Mirror {
    pub fn new(reflectance: Spd) -> Self {
        Self { reflectance }
    }
}

impl Material for Mirror {
    fn sample_direction(&self, wo: Vec3, lambda: f32, _sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let wi = reflect(wo);
        let cos = wi.y.abs();
        if cos == 0.0 {
            return None;
        }
        Some(BsdfSample {
            wi,
            f: self.reflectance.sample(lambda) / cos,
            pdf: 1.0,
        })
    }

    fn eval(&self, _wo: Vec3, _wi: Vec3, _lambda: f32) -> f32 {
        0.0
    }

    fn is_delta(&self) -> bool {
        true
    }
}

/// Sellmeier dispersion coefficients; `c` in square micrometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sellmeier {
    pub b: [f32; 3],
    pub c: [f32; 3],
}

impl Sellmeier {
    /// Schott N-BK7 borosilicate crown glass.
    pub const BK7: Sellmeier = Sellmeier {
        b: [1.039_612_1, 0.231_792_34, 1.010_469_5],
        c: [0.006_000_699, 0.020_017_914, 103.560_65],
    };

    /// Fused silica.
    pub const FUSED_SILICA: Sellmeier = Sellmeier {
        b: [0.696_166_3, 0.407_942_6, 0.897_479_4],
        c: [0.004_679_148, 0.013_512_063, 97.934_003],
    };

    /// Index of refraction at `lambda` nanometers.
    pub fn ior(&self, lambda: f32) -> f32 {
        let l2 = (lambda * 1e-3) * (lambda * 1e-3);
        let n2 = 1.0
            + self
                .b
                .iter()
                .zip(&self.c)
                .map(|(b, c)| b * l2 / (l2 - c))
                .sum::<f32>();
        n2.sqrt()
    }
}

/// Smooth dielectric with wavelength-dependent index of refraction.
#[derive(Debug, Clone)]
pub struct Glass {
    sellmeier: Sellmeier,
}

impl Glass {
    pub fn new(sellmeier: Sellmeier) -> Self {
        Self { sellmeier }
    }

    pub fn bk7() -> Self {
        Self::new(Sellmeier::BK7)
    }

    pub fn ior(&self, lambda: f32) -> f32 {
        self.sellmeier.ior(lambda)
    }
}

impl Material for Glass {
    fn sample_direction(&self, wo: Vec3, lambda: f32, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let cos_o = wo.y;
        if cos_o == 0.0 {
            return None;
        }

        // The outside of the surface is the side the normal points to
        let n = self.ior(lambda);
        let (eta_i, eta_t) = if cos_o > 0.0 { (1.0, n) } else { (n, 1.0) };
        let fresnel = fresnel_dielectric(cos_o.abs(), eta_i, eta_t);

        let wi = if sampler.next_1d() < fresnel {
            reflect(wo)
        } else {
            let normal = if cos_o > 0.0 { Vec3::Y } else { -Vec3::Y };
            match refract(wo, normal, eta_i / eta_t) {
                Some(wt) => wt,
                // Total internal reflection
                None => reflect(wo),
            }
        };

        let cos = wi.y.abs();
        if cos == 0.0 {
            return None;
        }
        Some(BsdfSample {
            wi,
            f: 1.0 / cos,
            pdf: 1.0,
        })
    }

    fn eval(&self, _wo: Vec3, _wi: Vec3, _lambda: f32) -> f32 {
        0.0
    }

    fn is_delta(&self) -> bool {
        true
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Mirror `w` about the local normal (+Y).
#[inline]
fn reflect(w: Vec3) -> Vec3 {
    Vec3::new(-w.x, w.y, -w.z)
}

/// Refract `wo` through a surface whose normal `n` is on the side of `wo`.
///
/// `eta` is the ratio of the index on `wo`'s side over the other side.
/// Returns `None` on total internal reflection.
#[inline]
fn refract(wo: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = wo.dot(n);
    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some(-eta * wo + (eta * cos_i - cos_t) * n)
}

/// Unpolarized Fresnel reflectance of a dielectric interface.
///
/// `cos_i` is the absolute cosine on the incident side with index `eta_i`.
pub fn fresnel_dielectric(cos_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    let cos_i = cos_i.clamp(0.0, 1.0);
    let sin_i = (1.0 - cos_i * cos_i).max(0.0).sqrt();
    let sin_t = eta_i / eta_t * sin_i;
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    let r_parallel = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let r_perpendicular = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    0.5 * (r_parallel * r_parallel + r_perpendicular * r_perpendicular)
}
