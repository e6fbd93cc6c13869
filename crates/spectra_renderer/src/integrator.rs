//! Light transport integrators.
//!
//! Each call traces one path at one wavelength and returns a scalar
//! spectral radiance sample. A path ends when it hits a light, escapes to
//! the sky, is absorbed, loses at Russian roulette, or reaches `max_depth`
//! segments.

use crate::config::{IntegratorKind, RenderConfig};
use crate::{IntersectInfo, Ray, Sampler, Scene};
use spectra_math::Vec3;

/// Geometry of the first surface a camera ray hits, for the auxiliary layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstHit {
    pub position: Vec3,
    pub normal: Vec3,
    /// Distance from the camera ray origin
    pub depth: f32,
}

/// Result of tracing one camera path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// Spectral radiance at the path's wavelength
    pub radiance: f32,
    pub first_hit: Option<FirstHit>,
    /// Direction leaving the first vertex (the camera ray direction if nothing was hit)
    pub direction: Vec3,
}

/// Estimates radiance along camera rays.
pub trait Integrator: Send + Sync {
    fn integrate(&self, ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> PathSample;
}

/// Stochastic path termination that keeps the estimator unbiased.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RussianRoulette {
    survival: f32,
}

impl RussianRoulette {
    pub fn new(survival: f32) -> Self {
        assert!(
            survival > 0.0 && survival <= 1.0,
            "survival probability must be in (0, 1]"
        );
        Self { survival }
    }

    pub fn survival(&self) -> f32 {
        self.survival
    }

    /// Throughput weight for a surviving path, or `None` if it is terminated.
    #[inline]
    pub fn weight(&self, sampler: &mut dyn Sampler) -> Option<f32> {
        if sampler.next_1d() < self.survival {
            Some(1.0 / self.survival)
        } else {
            None
        }
    }
}

impl Default for RussianRoulette {
    fn default() -> Self {
        Self::new(0.99)
    }
}

/// Record the first vertex of a path.
fn first_hit(info: &IntersectInfo) -> FirstHit {
    FirstHit {
        position: info.position,
        normal: info.normal,
        depth: info.t,
    }
}

/// Unidirectional path tracer (PT).
#[derive(Debug, Clone)]
pub struct PathTracer {
    max_depth: u32,
    roulette: RussianRoulette,
}

impl PathTracer {
    pub fn new(max_depth: u32, roulette: RussianRoulette) -> Self {
        Self { max_depth, roulette }
    }
}

impl Integrator for PathTracer {
    fn integrate(&self, camera_ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> PathSample {
        let lambda = camera_ray.lambda();
        let mut result = PathSample {
            radiance: 0.0,
            first_hit: None,
            direction: camera_ray.direction(),
        };
        let mut ray = *camera_ray;
        let mut throughput = 1.0f32;

        for depth in 0..self.max_depth {
            let mut info = IntersectInfo::default();
            if !scene.intersect(&ray, &mut info) {
                result.radiance += throughput * scene.sky().radiance(&ray);
                break;
            }
            let Some(primitive) = info.primitive else {
                break;
            };
            if depth == 0 {
                result.first_hit = Some(first_hit(&info));
            }

            if let Some(light) = primitive.light() {
                result.radiance += throughput * light.le(&ray, &info);
                break;
            }

            let Some(weight) = self.roulette.weight(sampler) else {
                break;
            };
            throughput *= weight;

            let wo = info.frame.to_local(-ray.direction().normalize());
            let Some(bsdf) = primitive.material().sample_direction(wo, lambda, sampler) else {
                break;
            };
            if bsdf.pdf <= 0.0 {
                break;
            }
            throughput *= bsdf.f * bsdf.wi.y.abs() / bsdf.pdf;
            if throughput == 0.0 {
                break;
            }

            let wi = info.frame.to_world(bsdf.wi);
            if depth == 0 {
                result.direction = wi;
            }
            ray = Ray::spawn(info.position, wi, lambda);
        }

        result
    }
}

/// Path tracer with next event estimation (NEE) and no MIS.
///
/// At every non-delta surface vertex one light is picked uniformly and a
/// point on it is connected with a shadow ray. Emission found by bounce
/// rays is only counted where no such estimate was made: for camera rays
/// and for rays leaving a delta vertex.
#[derive(Debug, Clone)]
pub struct NeeIntegrator {
    max_depth: u32,
    roulette: RussianRoulette,
}

impl NeeIntegrator {
    pub fn new(max_depth: u32, roulette: RussianRoulette) -> Self {
        Self { max_depth, roulette }
    }

    /// Single-sample direct lighting estimate at `info`, without throughput.
    fn sample_light(
        &self,
        scene: &Scene,
        info: &IntersectInfo,
        wo: Vec3,
        lambda: f32,
        sampler: &mut dyn Sampler,
    ) -> f32 {
        let lights = scene.lights();
        if lights.is_empty() {
            return 0.0;
        }
        let Some(primitive) = info.primitive else {
            return 0.0;
        };

        let index = ((sampler.next_1d() * lights.len() as f32) as usize).min(lights.len() - 1);
        let light_primitive = &lights[index];
        let Some(light) = light_primitive.light() else {
            return 0.0;
        };
        let sample = light_primitive.sample_point(sampler);

        let to_light = sample.position - info.position;
        let distance_squared = to_light.length_squared();
        if distance_squared <= 0.0 || sample.pdf <= 0.0 {
            return 0.0;
        }
        let distance = distance_squared.sqrt();
        let wi_world = to_light / distance;
        let cos_light = sample.normal.dot(-wi_world).abs();
        if cos_light <= 0.0 {
            return 0.0;
        }

        let wi = info.frame.to_local(wi_world);
        let f = primitive.material().eval(wo, wi, lambda);
        if f == 0.0 {
            return 0.0;
        }

        // The shadow ray must reach the sampled point on the chosen light
        let shadow = Ray::spawn(info.position, wi_world, lambda);
        let mut shadow_info = IntersectInfo::default();
        if !scene.intersect(&shadow, &mut shadow_info) {
            return 0.0;
        }
        let reached = shadow_info
            .primitive
            .is_some_and(|hit| std::ptr::eq(hit, light_primitive.as_ref()))
            && (shadow_info.position - sample.position).length() <= 1e-3 * distance.max(1.0);
        if !reached {
            return 0.0;
        }

        let le = light.le(&shadow, &shadow_info);
        let light_pdf = sample.pdf * distance_squared / cos_light / lights.len() as f32;
        f * wi.y.abs() * le / light_pdf
    }
}

impl Integrator for NeeIntegrator {
    fn integrate(&self, camera_ray: &Ray, scene: &Scene, sampler: &mut dyn Sampler) -> PathSample {
        let lambda = camera_ray.lambda();
        let mut result = PathSample {
            radiance: 0.0,
            first_hit: None,
            direction: camera_ray.direction(),
        };
        let mut ray = *camera_ray;
        let mut throughput = 1.0f32;
        // Camera rays count emission like rays leaving a delta vertex
        let mut count_emission = true;

        for depth in 0..self.max_depth {
            let mut info = IntersectInfo::default();
            if !scene.intersect(&ray, &mut info) {
                result.radiance += throughput * scene.sky().radiance(&ray);
                break;
            }
            let Some(primitive) = info.primitive else {
                break;
            };
            if depth == 0 {
                result.first_hit = Some(first_hit(&info));
            }

            if let Some(light) = primitive.light() {
                if count_emission {
                    result.radiance += throughput * light.le(&ray, &info);
                }
                break;
            }

            let Some(weight) = self.roulette.weight(sampler) else {
                break;
            };
            throughput *= weight;

            let material = primitive.material();
            let wo = info.frame.to_local(-ray.direction().normalize());
            if !material.is_delta() {
                result.radiance += throughput * self.sample_light(scene, &info, wo, lambda, sampler);
            }

            let Some(bsdf) = material.sample_direction(wo, lambda, sampler) else {
                break;
            };
            if bsdf.pdf <= 0.0 {
                break;
            }
            throughput *= bsdf.f * bsdf.wi.y.abs() / bsdf.pdf;
            if throughput == 0.0 {
                break;
            }
            count_emission = material.is_delta();

            let wi = info.frame.to_world(bsdf.wi);
            if depth == 0 {
                result.direction = wi;
            }
            ray = Ray::spawn(info.position, wi, lambda);
        }

        result
    }
}

/// Build the integrator selected by `config`.
pub fn create_integrator(config: &RenderConfig) -> Box<dyn Integrator> {
    let roulette = RussianRoulette::new(config.rr_survival);
    match config.integrator {
        IntegratorKind::PathTracer => Box::new(PathTracer::new(config.max_depth, roulette)),
        IntegratorKind::Nee => Box::new(NeeIntegrator::new(config.max_depth, roulette)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkyKind;
    use crate::{AreaLight, Diffuse, Material, Mirror, PcgSampler, Plane, SceneBuilder, Spd, Sphere};
    use spectra_math::Transform;
    use std::sync::Arc;

    fn config(integrator: IntegratorKind) -> RenderConfig {
        let mut config = RenderConfig {
            integrator,
            ..RenderConfig::default()
        };
        config.sky.color = spectra_math::Vec3::splat(0.0);
        config
    }

    #[test]
    fn test_russian_roulette_is_unbiased() {
        let roulette = RussianRoulette::new(0.7);
        let mut sampler = PcgSampler::new(42);
        let n = 200_000;
        let mut sum = 0.0f64;
        let mut survivors = 0;
        for _ in 0..n {
            if let Some(w) = roulette.weight(&mut sampler) {
                sum += w as f64;
                survivors += 1;
            }
        }
        // E[weight] = p * (1 / p) = 1
        assert!((sum / n as f64 - 1.0).abs() < 0.01);
        assert!((survivors as f64 / n as f64 - 0.7).abs() < 0.01);
    }

    #[test]
    fn test_survival_of_one_never_terminates() {
        let roulette = RussianRoulette::new(1.0);
        let mut sampler = PcgSampler::new(1);
        assert!((0..10_000).all(|_| roulette.weight(&mut sampler) == Some(1.0)));
    }

    #[test]
    #[should_panic(expected = "survival probability")]
    fn test_zero_survival_panics() {
        RussianRoulette::new(0.0);
    }

    #[test]
    fn test_escape_returns_sky() {
        let mut config = config(IntegratorKind::PathTracer);
        config.sky.color = spectra_math::Vec3::ONE;
        config.sky.scale = 0.5;
        let scene = SceneBuilder::new().build(&config).unwrap();
        let integrator = create_integrator(&config);
        let mut sampler = PcgSampler::new(42);

        let sample = integrator.integrate(&Ray::new(Vec3::ZERO, -Vec3::Z, 550.0), &scene, &mut sampler);
        assert!((sample.radiance - 0.5).abs() < 1e-5);
        assert!(sample.first_hit.is_none());
        assert_eq!(sample.direction, -Vec3::Z);
    }

    #[test]
    fn test_direct_light_hit_depth_zero() {
        for kind in [IntegratorKind::PathTracer, IntegratorKind::Nee] {
            let config = config(kind);
            let white: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::constant(0.0)));
            let mut builder = SceneBuilder::new();
            builder.add_emitter(
                Arc::new(Sphere::new(1.0)),
                white,
                Arc::new(AreaLight::new(Spd::constant(3.0))),
                Transform::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            );
            let scene = builder.build(&config).unwrap();
            let integrator = create_integrator(&config);
            let mut sampler = PcgSampler::new(42);

            let sample = integrator.integrate(&Ray::new(Vec3::ZERO, -Vec3::Z, 600.0), &scene, &mut sampler);
            assert_eq!(sample.radiance, 3.0, "{kind}");
            let hit = sample.first_hit.unwrap();
            assert!((hit.depth - 4.0).abs() < 1e-5);
            assert!((hit.normal - Vec3::Z).length() < 1e-5);
        }
    }

    /// Diffuse floor lit by a large emitting quad overhead, no sky.
    fn lit_floor(kind: IntegratorKind) -> (Scene, Box<dyn Integrator>) {
        let mut config = config(kind);
        config.max_depth = 2;
        config.rr_survival = 1.0;
        let floor: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::constant(0.5)));
        let black: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::zero()));
        let mut builder = SceneBuilder::new();
        builder
            .add_shape(
                Arc::new(Plane::new()),
                floor,
                Transform::from_scale(Vec3::new(100.0, 1.0, 100.0)),
            )
            .add_emitter(
                Arc::new(Plane::new()),
                black,
                Arc::new(AreaLight::new(Spd::constant(1.0)).with_two_sided(true)),
                Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))
                    * Transform::from_scale(Vec3::new(4.0, 1.0, 4.0)),
            );
        let scene = builder.build(&config).unwrap();
        (scene, create_integrator(&config))
    }

    fn mean_radiance(kind: IntegratorKind, n: usize) -> f64 {
        let (scene, integrator) = lit_floor(kind);
        let mut sampler = PcgSampler::new(7);
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), -Vec3::Y, 550.0);
        (0..n)
            .map(|_| integrator.integrate(&ray, &scene, &mut sampler).radiance as f64)
            .sum::<f64>()
            / n as f64
    }

    #[test]
    fn test_nee_agrees_with_path_tracing() {
        // Albedo times the form factor of a 4x4 emitter one unit above the point
        let x = 2.0 / 5.0f64.sqrt();
        let expected = 0.5 * 4.0 * x * x.atan() / std::f64::consts::PI;

        let pt = mean_radiance(IntegratorKind::PathTracer, 200_000);
        let nee = mean_radiance(IntegratorKind::Nee, 50_000);
        assert!((pt - expected).abs() < 0.01, "pt {pt} vs {expected}");
        assert!((nee - expected).abs() < 0.01, "nee {nee} vs {expected}");
    }

    #[test]
    fn test_nee_counts_emission_after_mirror() {
        let mut config = config(IntegratorKind::Nee);
        config.rr_survival = 1.0;
        let mirror: Arc<dyn Material> = Arc::new(Mirror::new(Spd::constant(1.0)));
        let black: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::zero()));
        let mut builder = SceneBuilder::new();
        builder
            .add_shape(
                Arc::new(Plane::new()),
                mirror,
                Transform::from_scale(Vec3::new(10.0, 1.0, 10.0)),
            )
            .add_emitter(
                Arc::new(Sphere::new(0.5)),
                black,
                Arc::new(AreaLight::new(Spd::constant(2.0))),
                Transform::from_translation(Vec3::new(0.0, 3.0, 0.0)),
            );
        let scene = builder.build(&config).unwrap();
        let integrator = create_integrator(&config);
        let mut sampler = PcgSampler::new(42);

        // Straight down onto the mirror, straight back up into the light
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 550.0);
        let sample = integrator.integrate(&ray, &scene, &mut sampler);
        assert!((sample.radiance - 2.0).abs() < 1e-5);
        assert!((sample.direction - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_sky_kind_does_not_matter_to_integrator() {
        let mut config = config(IntegratorKind::Nee);
        config.sky.kind = SkyKind::Gradient;
        config.sky.horizon = Vec3::ONE;
        config.sky.zenith = Vec3::ONE;
        let scene = SceneBuilder::new().build(&config).unwrap();
        let integrator = create_integrator(&config);
        let mut sampler = PcgSampler::new(42);
        let sample = integrator.integrate(&Ray::new(Vec3::ZERO, Vec3::Y, 550.0), &scene, &mut sampler);
        assert!((sample.radiance - 1.0).abs() < 1e-5);
    }
}
