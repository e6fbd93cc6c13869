//! Scene container and builder.
//!
//! A [`Scene`] is read-only while a pass runs and is shared by reference
//! across worker threads; only the camera changes, and only between passes.

use crate::bvh::BvhIntersector;
use crate::camera::{create_camera, Camera};
use crate::config::{CameraSettings, IntersectorKind, RenderConfig, SkySettings};
use crate::error::ConfigError;
use crate::intersector::{Intersector, LinearIntersector};
use crate::shape::Shape;
use crate::sky::{create_sky, ImageSky, Sky};
use crate::{IntersectInfo, Light, Material, Primitive, Ray};
use spectra_math::Transform;
use std::sync::Arc;

/// Camera, geometry and background of a render.
pub struct Scene {
    camera: Box<dyn Camera>,
    camera_settings: CameraSettings,
    intersector: Box<dyn Intersector>,
    intersector_kind: IntersectorKind,
    sky: Box<dyn Sky>,
    sky_settings: SkySettings,
    sky_image: Option<ImageSky>,
    lights: Vec<Arc<Primitive>>,
}

fn build_intersector(kind: IntersectorKind, primitives: Vec<Arc<Primitive>>) -> Box<dyn Intersector> {
    match kind {
        IntersectorKind::Linear => Box::new(LinearIntersector::new(primitives)),
        IntersectorKind::Bvh => Box::new(BvhIntersector::new(primitives)),
    }
}

impl Scene {
    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    /// Mutable camera access; only valid between passes.
    pub fn camera_mut(&mut self) -> &mut dyn Camera {
        self.camera.as_mut()
    }

    pub fn sky(&self) -> &dyn Sky {
        self.sky.as_ref()
    }

    pub fn intersector(&self) -> &dyn Intersector {
        self.intersector.as_ref()
    }

    pub fn primitives(&self) -> &[Arc<Primitive>] {
        self.intersector.primitives()
    }

    /// Emissive primitives, for explicit light sampling.
    pub fn lights(&self) -> &[Arc<Primitive>] {
        &self.lights
    }

    /// Nearest hit along `ray`.
    #[inline]
    pub fn intersect<'a>(&'a self, ray: &Ray, info: &mut IntersectInfo<'a>) -> bool {
        self.intersector.intersect(ray, info)
    }

    /// Re-derive the camera, sky and intersector from a new configuration.
    ///
    /// Only parts whose settings changed are rebuilt. With unchanged camera
    /// settings the current placement is kept and only the film is updated.
    /// Nothing is modified if an error is returned.
    pub fn apply_config(&mut self, config: &RenderConfig) -> Result<(), ConfigError> {
        let sky = if config.sky != self.sky_settings {
            Some(create_sky(&config.sky, self.sky_image.as_ref())?)
        } else {
            None
        };

        if let Some(sky) = sky {
            self.sky = sky;
            self.sky_settings = config.sky.clone();
        }

        if config.camera != self.camera_settings {
            self.camera = create_camera(
                &config.camera,
                config.width,
                config.height,
                config.film_width,
                config.film_height,
            );
            self.camera_settings = config.camera.clone();
        } else {
            self.camera
                .frame_mut()
                .set_film(config.width, config.height, config.film_width, config.film_height);
        }

        if config.intersector != self.intersector_kind {
            let primitives = self.intersector.primitives().to_vec();
            self.intersector = build_intersector(config.intersector, primitives);
            self.intersector_kind = config.intersector;
        }
        Ok(())
    }

    /// Install a camera model built outside the configuration.
    ///
    /// It stays in place until an applied configuration changes the camera settings.
    pub fn set_camera(&mut self, camera: Box<dyn Camera>) {
        self.camera = camera;
    }
}

/// Collects primitives and builds a [`Scene`] for a configuration.
#[derive(Default)]
pub struct SceneBuilder {
    primitives: Vec<Arc<Primitive>>,
    sky_image: Option<ImageSky>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the scene.
    pub fn add(&mut self, primitive: Primitive) -> &mut Self {
        self.primitives.push(Arc::new(primitive));
        self
    }

    /// Add an already shared primitive.
    pub fn add_shared(&mut self, primitive: Arc<Primitive>) -> &mut Self {
        self.primitives.push(primitive);
        self
    }

    /// Add a non-emissive shape.
    pub fn add_shape(
        &mut self,
        shape: Arc<dyn Shape>,
        material: Arc<dyn Material>,
        transform: Transform,
    ) -> &mut Self {
        self.add(Primitive::new(shape, material, transform))
    }

    /// Add an emissive shape.
    pub fn add_emitter(
        &mut self,
        shape: Arc<dyn Shape>,
        material: Arc<dyn Material>,
        light: Arc<dyn Light>,
        transform: Transform,
    ) -> &mut Self {
        self.add(Primitive::new(shape, material, transform).with_light(light))
    }

    /// Texels for [`crate::config::SkyKind::Image`].
    pub fn sky_image(&mut self, image: ImageSky) -> &mut Self {
        self.sky_image = Some(image);
        self
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Validate `config` and assemble the scene.
    pub fn build(&self, config: &RenderConfig) -> Result<Scene, ConfigError> {
        config.validate()?;

        let camera = create_camera(
            &config.camera,
            config.width,
            config.height,
            config.film_width,
            config.film_height,
        );
        let sky = create_sky(&config.sky, self.sky_image.as_ref())?;
        let lights: Vec<Arc<Primitive>> = self
            .primitives
            .iter()
            .filter(|p| p.is_light())
            .cloned()
            .collect();
        let intersector = build_intersector(config.intersector, self.primitives.clone());

        log::info!(
            "Scene built: {} primitives, {} lights, {} camera, {} sky, {} intersector",
            self.primitives.len(),
            lights.len(),
            config.camera.kind,
            config.sky.kind,
            config.intersector
        );

        Ok(Scene {
            camera,
            camera_settings: config.camera.clone(),
            intersector,
            intersector_kind: config.intersector,
            sky,
            sky_settings: config.sky.clone(),
            sky_image: self.sky_image.clone(),
            lights,
        })
    }
}
