//! Render configuration.
//!
//! Plain value structs with serde derives so callers can load them from
//! JSON or any other serde format. Kind enums parse from and print as their
//! canonical lowercase names.

use crate::error::ConfigError;
use crate::Color;
use serde::{Deserialize, Serialize};
use spectra_math::Vec3;
use std::fmt;
use std::str::FromStr;

/// Declares a kind enum with `FromStr`/`Display` over canonical names.
///
/// Extra aliases are accepted when parsing but never printed.
macro_rules! kind_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $canonical $(, alias = $alias)*)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($canonical $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(ConfigError::UnknownKind {
                        kind: $label,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

kind_enum! {
    /// Camera model.
    CameraKind, "camera" {
        Pinhole => "pinhole",
        ThinLens => "thin_lens",
        Environment => "environment",
    }
}

kind_enum! {
    /// Light transport algorithm.
    IntegratorKind, "integrator" {
        PathTracer => "pt",
        Nee => "nee",
    }
}

kind_enum! {
    /// Random stream used for sampling.
    SamplerKind, "sampler" {
        Pcg => "pcg",
        Std => "std",
    }
}

kind_enum! {
    /// Background model.
    SkyKind, "sky" {
        Uniform => "uniform",
        Image => "image",
        Gradient => "gradient",
    }
}

kind_enum! {
    /// Ray-scene intersection structure.
    IntersectorKind, "intersector" {
        Linear => "linear",
        Bvh => "bvh",
    }
}

kind_enum! {
    /// Tone mapping curve applied to the exported color layer.
    ToneMapOperator, "tone map" {
        Linear => "linear" | "clamp",
        Reinhard => "reinhard",
        Aces => "aces",
    }
}

kind_enum! {
    /// How samples are accumulated.
    RenderMode, "render mode" {
        Batch => "batch",
        Progressive => "progressive" | "realtime",
    }
}

/// Camera placement and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub kind: CameraKind,
    /// Horizontal field of view in degrees
    pub fov: f32,
    /// Thin lens aperture radius in scene units
    pub lens_radius: f32,
    /// Thin lens distance to the plane of focus
    pub focus_distance: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            kind: CameraKind::Pinhole,
            fov: 90.0,
            lens_radius: 0.0,
            focus_distance: 1.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
        }
    }
}

/// Background settings. Colors are linear RGB upsampled to spectra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkySettings {
    pub kind: SkyKind,
    /// Uniform sky color
    pub color: Color,
    /// Gradient color looking straight down
    pub horizon: Color,
    /// Gradient color looking straight up
    pub zenith: Color,
    pub scale: f32,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            kind: SkyKind::Uniform,
            color: Color::ONE,
            horizon: Color::ONE,
            zenith: Color::new(0.5, 0.7, 1.0),
            scale: 1.0,
        }
    }
}

/// Tone mapping for the exported color layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMapSettings {
    pub operator: ToneMapOperator,
    /// Exposure adjustment in stops
    pub exposure: f32,
    pub gamma: f32,
}

impl Default for ToneMapSettings {
    fn default() -> Self {
        Self {
            operator: ToneMapOperator::Linear,
            exposure: 0.0,
            gamma: 2.2,
        }
    }
}

/// Everything the renderer needs besides the scene geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Physical film width in scene units
    pub film_width: f32,
    /// Physical film height in scene units
    pub film_height: f32,
    /// Samples per pixel in batch mode
    pub samples: u32,
    /// Maximum path segments
    pub max_depth: u32,
    pub mode: RenderMode,
    pub camera: CameraSettings,
    pub integrator: IntegratorKind,
    pub sampler: SamplerKind,
    pub sky: SkySettings,
    pub intersector: IntersectorKind,
    pub tone_map: ToneMapSettings,
    /// Horizontal tile partition factor
    pub tiles_x: u32,
    /// Vertical tile partition factor
    pub tiles_y: u32,
    /// Worker threads; 0 uses the available parallelism
    pub threads: usize,
    /// Base seed for all pixel streams
    pub seed: u64,
    /// Russian roulette survival probability
    pub rr_survival: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            film_width: 0.036,
            film_height: 0.027,
            samples: 16,
            max_depth: 16,
            mode: RenderMode::Batch,
            camera: CameraSettings::default(),
            integrator: IntegratorKind::PathTracer,
            sampler: SamplerKind::Pcg,
            sky: SkySettings::default(),
            intersector: IntersectorKind::Bvh,
            tone_map: ToneMapSettings::default(),
            tiles_x: 8,
            tiles_y: 8,
            threads: 0,
            seed: 0,
            rr_survival: 0.99,
        }
    }
}

impl RenderConfig {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples = samples;
        self.max_depth = max_depth;
        self
    }

    /// Check every setting. Called by the renderer before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.film_width) || !positive(self.film_height) {
            return Err(ConfigError::InvalidFilmSize {
                width: self.film_width,
                height: self.film_height,
            });
        }
        if !(self.rr_survival > 0.0 && self.rr_survival <= 1.0) {
            return Err(ConfigError::InvalidSurvivalProbability(self.rr_survival));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max depth",
                value: 0.0,
            });
        }
        if self.tiles_x == 0 || self.tiles_y == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "tile partition",
                value: self.tiles_x.min(self.tiles_y) as f32,
            });
        }

        let camera = &self.camera;
        if camera.kind != CameraKind::Environment && !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::InvalidParameter {
                name: "field of view",
                value: camera.fov,
            });
        }
        if camera.kind == CameraKind::ThinLens {
            if !(camera.lens_radius >= 0.0 && camera.lens_radius.is_finite()) {
                return Err(ConfigError::InvalidParameter {
                    name: "lens radius",
                    value: camera.lens_radius,
                });
            }
            if !positive(camera.focus_distance) {
                return Err(ConfigError::InvalidParameter {
                    name: "focus distance",
                    value: camera.focus_distance,
                });
            }
        }
        let forward = camera.look_at - camera.look_from;
        if forward.length_squared() <= 1e-12 || camera.up.cross(forward).length_squared() <= 1e-12 {
            return Err(ConfigError::InvalidParameter {
                name: "camera orientation",
                value: forward.length(),
            });
        }

        if !(self.sky.scale >= 0.0 && self.sky.scale.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "sky scale",
                value: self.sky.scale,
            });
        }
        if !positive(self.tone_map.gamma) {
            return Err(ConfigError::InvalidParameter {
                name: "gamma",
                value: self.tone_map.gamma,
            });
        }
        if !self.tone_map.exposure.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "exposure",
                value: self.tone_map.exposure,
            });
        }
        Ok(())
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(RenderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [CameraKind::Pinhole, CameraKind::ThinLens, CameraKind::Environment] {
            assert_eq!(kind.to_string().parse::<CameraKind>(), Ok(kind));
        }
        assert_eq!("nee".parse::<IntegratorKind>(), Ok(IntegratorKind::Nee));
        assert_eq!("PT".parse::<IntegratorKind>(), Ok(IntegratorKind::PathTracer));
        assert_eq!("std".parse::<SamplerKind>(), Ok(SamplerKind::Std));
        assert_eq!("gradient".parse::<SkyKind>(), Ok(SkyKind::Gradient));
        assert_eq!("bvh".parse::<IntersectorKind>(), Ok(IntersectorKind::Bvh));
        assert_eq!("clamp".parse::<ToneMapOperator>(), Ok(ToneMapOperator::Linear));
        assert_eq!(ToneMapOperator::Linear.to_string(), "linear");
        assert_eq!("aces".parse::<ToneMapOperator>(), Ok(ToneMapOperator::Aces));
    }

    #[test]
    fn test_unknown_kind_errors() {
        let err = "orthographic".parse::<CameraKind>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownKind {
                kind: "camera",
                value: "orthographic".to_string()
            }
        );
        assert!(err.to_string().contains("orthographic"));
        assert!("mlt".parse::<IntegratorKind>().is_err());
        assert!("sobol".parse::<SamplerKind>().is_err());
        assert!("hosek".parse::<SkyKind>().is_err());
        assert!("embree".parse::<IntersectorKind>().is_err());
        assert!("filmic".parse::<ToneMapOperator>().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = RenderConfig::default();

        let config = base.clone().with_resolution(0, 10);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroResolution { .. })));

        let config = base.clone().with_quality(0, 4);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSamples));

        let config = RenderConfig {
            film_width: -1.0,
            ..base.clone()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFilmSize { .. })));

        for p in [0.0, 1.5, f32::NAN] {
            let config = RenderConfig {
                rr_survival: p,
                ..base.clone()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidSurvivalProbability(_))
            ));
        }

        let mut config = base.clone();
        config.camera.up = Vec3::new(0.0, 0.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "camera orientation", .. })
        ));
    }

    #[test]
    fn test_json_round_trip_uses_canonical_names() {
        let mut config = RenderConfig::default();
        config.camera.kind = CameraKind::ThinLens;
        config.integrator = IntegratorKind::Nee;
        config.tone_map.operator = ToneMapOperator::Reinhard;

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"thin_lens\""));
        assert!(json.contains("\"nee\""));
        assert!(json.contains("\"reinhard\""));

        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "width": 32, "height": 16, "tone_map": { "operator": "clamp" } }"#)
                .unwrap();
        assert_eq!((config.width, config.height), (32, 16));
        assert_eq!(config.samples, RenderConfig::default().samples);
        assert_eq!(config.tone_map.operator, ToneMapOperator::Linear);
        assert_eq!(config.tone_map.gamma, 2.2);
    }
}
