//! Background radiance for rays that leave the scene.

use crate::config::{SkyKind, SkySettings};
use crate::error::ConfigError;
use crate::spectrum::rgb_to_spectral;
use crate::{Color, Ray, Spd};
use spectra_math::Vec3;
use std::f32::consts::PI;

/// Radiance arriving from infinitely far away.
pub trait Sky: Send + Sync {
    /// Radiance seen along `ray` at the ray's wavelength.
    fn radiance(&self, ray: &Ray) -> f32;
}

/// Same radiance in every direction.
#[derive(Debug, Clone)]
pub struct UniformSky {
    spd: Spd,
    scale: f32,
}

impl UniformSky {
    pub fn new(spd: Spd, scale: f32) -> Self {
        Self { spd, scale }
    }
}

impl Sky for UniformSky {
    fn radiance(&self, ray: &Ray) -> f32 {
        self.spd.sample(ray.lambda()) * self.scale
    }
}

/// Blend from the horizon spectrum straight down to the zenith spectrum straight up.
#[derive(Debug, Clone)]
pub struct GradientSky {
    horizon: Spd,
    zenith: Spd,
    scale: f32,
}

impl GradientSky {
    pub fn new(horizon: Spd, zenith: Spd, scale: f32) -> Self {
        Self {
            horizon,
            zenith,
            scale,
        }
    }
}

impl Sky for GradientSky {
    fn radiance(&self, ray: &Ray) -> f32 {
        let unit_direction = ray.direction().normalize();
        let a = 0.5 * (unit_direction.y + 1.0);
        let lambda = ray.lambda();
        ((1.0 - a) * self.horizon.sample(lambda) + a * self.zenith.sample(lambda)) * self.scale
    }
}

/// Equirectangular environment map of linear RGB texels.
///
/// Row 0 is straight up. The image center looks down -Z and `u`
/// increases toward +X, matching [`crate::EnvironmentCamera`].
#[derive(Debug, Clone)]
pub struct ImageSky {
    width: usize,
    height: usize,
    texels: Vec<Color>,
    scale: f32,
}

impl ImageSky {
    pub fn new(width: usize, height: usize, texels: Vec<Color>) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 || texels.len() != width * height {
            return Err(ConfigError::SkyImageSize {
                width,
                height,
                texels: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
            scale: 1.0,
        })
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Texture coordinates of a direction.
    fn direction_to_uv(direction: Vec3) -> (f32, f32) {
        let d = direction.normalize();
        let phi = d.x.atan2(-d.z);
        let theta = d.y.clamp(-1.0, 1.0).acos();
        (0.5 + phi / (2.0 * PI), theta / PI)
    }

    #[inline]
    fn texel(&self, x: isize, y: isize) -> Color {
        let x = x.rem_euclid(self.width as isize) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.texels[y * self.width + x]
    }

    /// Bilinear lookup; wraps horizontally and clamps vertically.
    pub fn lookup(&self, direction: Vec3) -> Color {
        let (u, v) = Self::direction_to_uv(direction);
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as isize, y0 as isize);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}

impl Sky for ImageSky {
    fn radiance(&self, ray: &Ray) -> f32 {
        let rgb = self.lookup(ray.direction()).max(Color::ZERO);
        rgb_to_spectral(rgb, ray.lambda()) * self.scale
    }
}

/// Build the sky described by `settings`.
///
/// An image sky needs texels from the caller; `image` is ignored for other kinds.
pub fn create_sky(settings: &SkySettings, image: Option<&ImageSky>) -> Result<Box<dyn Sky>, ConfigError> {
    Ok(match settings.kind {
        SkyKind::Uniform => Box::new(UniformSky::new(Spd::from_rgb(settings.color), settings.scale)),
        SkyKind::Gradient => Box::new(GradientSky::new(
            Spd::from_rgb(settings.horizon),
            Spd::from_rgb(settings.zenith),
            settings.scale,
        )),
        SkyKind::Image => {
            let image = image.ok_or(ConfigError::MissingSkyImage)?;
            Box::new(image.clone().with_scale(settings.scale))
        }
    })
}
