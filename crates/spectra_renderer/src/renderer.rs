//! Tile-parallel spectral renderer.
//!
//! A pass splits the image into buckets, renders them on the worker pool and
//! merges the per-bucket spectra into the film. Batch renders take every
//! sample in one pass; progressive renders add one sample per pixel per pass
//! and keep a running average until the accumulation is reset.

use crate::bucket::{generate_buckets, render_bucket, Bucket, PixelAccum};
use crate::config::{RenderConfig, RenderMode};
use crate::error::{ConfigError, RenderResult};
use crate::executor::TileExecutor;
use crate::film::Film;
use crate::integrator::{create_integrator, Integrator};
use crate::layer::{LayerKind, RenderLayer};
use crate::sampler::{create_sampler, pixel_sample_seed, pixel_seed};
use crate::spectrum::{sample_wavelength, LAMBDA_PDF};
use crate::{Color, Sampler, Scene};
use log::{debug, info, warn};
use spectra_math::Vec3;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag that asks a running pass to stop.
///
/// Workers poll it before every sample; samples already committed are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Pixel completion counter of the current pass, readable from any thread.
#[derive(Debug, Default)]
pub struct RenderProgress {
    completed: AtomicU64,
    total: AtomicU64,
}

impl RenderProgress {
    fn begin(&self, total: u64) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub(crate) fn pixel_done(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed_pixels(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total_pixels(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Fraction of pixels finished in `[0, 1]`; zero before any pass starts.
    pub fn fraction(&self) -> f32 {
        let total = self.total_pixels();
        if total == 0 {
            return 0.0;
        }
        (self.completed_pixels() as f64 / total as f64).min(1.0) as f32
    }
}

/// Summary of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    /// Progressive passes accumulated so far (1 for a batch render)
    pub passes: u32,
    pub samples_committed: u64,
    pub samples_discarded: u64,
    pub elapsed: Duration,
    /// False if the pass was cancelled before every pixel finished
    pub completed: bool,
}

/// Camera placement change applied between passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraUpdate {
    LookAt { look_from: Vec3, look_at: Vec3, up: Vec3 },
    /// Offset in camera space (`x` right, `y` up, `z` backward)
    Move(Vec3),
    /// Yaw and pitch in radians
    Rotate { yaw: f32, pitch: f32 },
}

/// Display-ready image layers, each `width * height * 3` floats in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    /// Tone mapped and gamma encoded color
    pub color: Vec<f32>,
    /// First-hit normals remapped from `[-1, 1]` to `[0, 1]`
    pub normal: Vec<f32>,
    /// First-hit distance divided by the largest finite distance
    pub depth: Vec<f32>,
    /// First-hit world positions, unscaled
    pub position: Vec<f32>,
    /// First-vertex outgoing directions remapped to `[0, 1]`
    pub direction: Vec<f32>,
}

impl RenderOutput {
    pub fn layer(&self, kind: LayerKind) -> &[f32] {
        match kind {
            LayerKind::Color => &self.color,
            LayerKind::Normal => &self.normal,
            LayerKind::Depth => &self.depth,
            LayerKind::Position => &self.position,
            LayerKind::Direction => &self.direction,
        }
    }

    /// Quantize a layer to 8-bit RGB, clamping to `[0, 1]`.
    pub fn to_rgb8(&self, kind: LayerKind) -> Vec<u8> {
        self.layer(kind)
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassMode {
    Batch { samples: u32 },
    Progressive { pass: u32 },
}

/// Read-only state shared by every worker during a pass.
pub struct PassContext<'a> {
    pub(crate) scene: &'a Scene,
    pub(crate) integrator: &'a dyn Integrator,
    pub(crate) sampler: &'a dyn Sampler,
    pub(crate) mode: PassMode,
    pub(crate) width: u32,
    pub(crate) seed: u64,
    pub(crate) cancel: &'a CancelFlag,
    pub(crate) progress: &'a RenderProgress,
}

/// Trace all samples of pixel `(x, y)` for the current pass.
///
/// Returns the accumulation and whether every sample was taken.
pub(crate) fn render_pixel(ctx: &PassContext<'_>, x: u32, y: u32) -> (PixelAccum, bool) {
    let pixel_index = y as u64 * ctx.width as u64 + x as u64;
    let (samples, seed) = match ctx.mode {
        PassMode::Batch { samples } => (samples, pixel_seed(ctx.seed, pixel_index)),
        PassMode::Progressive { pass } => (1, pixel_sample_seed(ctx.seed, pixel_index, pass as u64)),
    };
    let mut sampler = ctx.sampler.clone_seeded(seed);
    let camera = ctx.scene.camera();
    let mut accum = PixelAccum::default();

    for _ in 0..samples {
        if ctx.cancel.is_cancelled() {
            return (accum, false);
        }

        let film_pos = camera.sample_film(x, y, sampler.as_mut());
        let lambda = sample_wavelength(sampler.next_1d());
        let Some(camera_ray) = camera.generate_ray(film_pos, lambda, sampler.as_mut()) else {
            accum.commit_empty();
            continue;
        };

        let path = ctx.integrator.integrate(&camera_ray.ray, ctx.scene, sampler.as_mut());
        let phi = path.radiance * camera_ray.cos / (LAMBDA_PDF * camera_ray.pdf);
        if !phi.is_finite() || phi < 0.0 {
            warn!("Discarding degenerate sample at pixel ({x}, {y}): flux {phi} at {lambda:.1} nm");
            accum.discarded += 1;
            continue;
        }
        accum.commit(lambda, phi, &path);
    }
    (accum, true)
}

/// Owns the scene, the accumulation buffers and the worker pool.
pub struct Renderer {
    config: RenderConfig,
    scene: Scene,
    integrator: Box<dyn Integrator>,
    sampler: Box<dyn Sampler>,
    executor: TileExecutor,
    buckets: Vec<Bucket>,
    film: Film,
    layer: RenderLayer,
    progress: Arc<RenderProgress>,
    passes: u32,
    last_elapsed: Duration,
}

impl Renderer {
    /// Validate `config`, sync the scene to it and start the worker pool.
    pub fn new(config: RenderConfig, mut scene: Scene) -> RenderResult<Self> {
        config.validate()?;
        scene.apply_config(&config)?;
        let executor = TileExecutor::new(config.threads)?;
        info!(
            "Renderer ready: {}x{}, {} spp, {} integrator, {} threads",
            config.width,
            config.height,
            config.samples,
            config.integrator,
            executor.threads()
        );

        Ok(Self {
            integrator: create_integrator(&config),
            sampler: create_sampler(config.sampler, config.seed),
            buckets: generate_buckets(config.width, config.height, config.tiles_x, config.tiles_y),
            film: Film::new(config.width, config.height),
            layer: RenderLayer::new(config.width, config.height),
            progress: Arc::new(RenderProgress::default()),
            passes: 0,
            last_elapsed: Duration::ZERO,
            executor,
            scene,
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn layer(&self) -> &RenderLayer {
        &self.layer
    }

    pub fn film(&self) -> &Film {
        &self.film
    }

    /// Progressive passes accumulated since the last reset.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Replace the configuration. Any change discards the accumulation.
    ///
    /// On error the previous configuration stays in effect.
    pub fn set_config(&mut self, config: RenderConfig) -> RenderResult<()> {
        config.validate()?;
        let executor = if config.threads != self.config.threads {
            Some(TileExecutor::new(config.threads)?)
        } else {
            None
        };
        self.scene.apply_config(&config)?;

        if let Some(executor) = executor {
            self.executor = executor;
        }

        self.integrator = create_integrator(&config);
        self.sampler = create_sampler(config.sampler, config.seed);
        self.buckets = generate_buckets(config.width, config.height, config.tiles_x, config.tiles_y);
        if (config.width, config.height) != (self.config.width, self.config.height) {
            self.film = Film::new(config.width, config.height);
            self.layer = RenderLayer::new(config.width, config.height);
        }
        self.config = config;
        self.reset_accumulation();
        debug!("Render configuration updated");
        Ok(())
    }

    /// Move the camera between passes and restart accumulation.
    pub fn update_camera(&mut self, update: CameraUpdate) -> RenderResult<()> {
        let camera = self.scene.camera_mut();
        match update {
            CameraUpdate::LookAt { look_from, look_at, up } => {
                let forward = look_at - look_from;
                if forward.length_squared() <= 1e-12 || up.cross(forward).length_squared() <= 1e-12 {
                    return Err(ConfigError::InvalidParameter {
                        name: "camera orientation",
                        value: forward.length(),
                    }
                    .into());
                }
                camera.set_look_at(look_from, look_at, up);
            }
            CameraUpdate::Move(delta) => camera.move_camera(delta),
            CameraUpdate::Rotate { yaw, pitch } => camera.rotate_camera(yaw, pitch),
        }
        self.reset_accumulation();
        Ok(())
    }

    /// Drop all accumulated samples.
    pub fn reset_accumulation(&mut self) {
        self.film.clear();
        self.layer.clear();
        self.passes = 0;
    }

    /// Share the pixel counter of the running pass with another thread.
    pub fn progress_tracker(&self) -> Arc<RenderProgress> {
        Arc::clone(&self.progress)
    }

    /// Fraction of pixels finished in the current or last pass.
    pub fn render_progress(&self) -> f32 {
        self.progress.fraction()
    }

    /// Wall time of the last pass in milliseconds.
    pub fn rendering_time_ms(&self) -> f64 {
        self.last_elapsed.as_secs_f64() * 1000.0
    }

    /// Render in the configured mode: a full batch render, or one progressive pass.
    pub fn render_configured(&mut self, cancel: &CancelFlag) -> RenderStats {
        match self.config.mode {
            RenderMode::Batch => self.render(cancel),
            RenderMode::Progressive => self.render_progressive_pass(cancel),
        }
    }

    /// Clear the film and take `samples` samples in every pixel.
    pub fn render(&mut self, cancel: &CancelFlag) -> RenderStats {
        self.reset_accumulation();
        let samples = self.config.samples;
        let stats = self.run_pass(PassMode::Batch { samples }, cancel);
        self.passes = 1;
        RenderStats { passes: 1, ..stats }
    }

    /// Add one sample per pixel to the running average.
    pub fn render_progressive_pass(&mut self, cancel: &CancelFlag) -> RenderStats {
        let pass = self.passes;
        let stats = self.run_pass(PassMode::Progressive { pass }, cancel);
        self.passes += 1;
        RenderStats {
            passes: self.passes,
            ..stats
        }
    }

    fn run_pass(&mut self, mode: PassMode, cancel: &CancelFlag) -> RenderStats {
        let start = Instant::now();
        self.progress.begin(self.config.pixel_count() as u64);
        info!(
            "Starting {} pass over {} buckets",
            match mode {
                PassMode::Batch { .. } => "batch".to_string(),
                PassMode::Progressive { pass } => format!("progressive #{pass}"),
            },
            self.buckets.len()
        );

        let ctx = PassContext {
            scene: &self.scene,
            integrator: self.integrator.as_ref(),
            sampler: self.sampler.as_ref(),
            mode,
            width: self.config.width,
            seed: self.config.seed,
            cancel,
            progress: &self.progress,
        };
        let results = self.executor.run(&self.buckets, |bucket| render_bucket(bucket, &ctx));

        let mut committed = 0;
        let mut discarded = 0;
        let mut completed = true;
        for result in &results {
            committed += result.samples();
            discarded += result.discarded();
            completed &= result.completed;
            for ((x, y), accum) in result.iter() {
                self.film.accumulate(x, y, &accum.spectrum);
                self.layer.accumulate(x, y, accum);
            }
        }
        self.layer.resolve_color(&self.film);

        self.last_elapsed = start.elapsed();
        if completed {
            info!(
                "Pass finished in {:.1} ms: {committed} samples, {discarded} discarded",
                self.rendering_time_ms()
            );
        } else {
            info!(
                "Pass cancelled after {:.1} ms at {:.0}%: {committed} samples kept",
                self.rendering_time_ms(),
                self.progress.fraction() * 100.0
            );
        }

        RenderStats {
            passes: self.passes,
            samples_committed: committed,
            samples_discarded: discarded,
            elapsed: self.last_elapsed,
            completed,
        }
    }

    /// Average linear color of pixel `(x, y)`.
    pub fn pixel_color(&self, x: u32, y: u32) -> Color {
        self.layer.color(x, y)
    }

    /// Convert the accumulated layers to display-ready buffers.
    pub fn export(&self) -> RenderOutput {
        let (width, height) = (self.config.width, self.config.height);
        let n = width as usize * height as usize * 3;
        let mut output = RenderOutput {
            width,
            height,
            color: Vec::with_capacity(n),
            normal: Vec::with_capacity(n),
            depth: Vec::with_capacity(n),
            position: Vec::with_capacity(n),
            direction: Vec::with_capacity(n),
        };

        let max_depth = self.layer.max_depth().filter(|d| *d > 0.0).unwrap_or(1.0);
        let remap = |v: Vec3| v * 0.5 + Vec3::splat(0.5);
        for y in 0..height {
            for x in 0..width {
                let color = self.config.tone_map.apply(self.layer.color(x, y));
                let normal = self.layer.normal(x, y).map_or(Vec3::ZERO, remap);
                let depth = self.layer.depth(x, y).map_or(0.0, |d| d / max_depth);
                let position = self.layer.position(x, y).unwrap_or(Vec3::ZERO);
                let direction = remap(self.layer.direction(x, y));

                output.color.extend(color.to_array());
                output.normal.extend(normal.to_array());
                output.depth.extend([depth; 3]);
                output.position.extend(position.to_array());
                output.direction.extend(direction.to_array());
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkyKind;
    use crate::camera::{CameraFrame, CameraRay, PinholeCamera};
    use crate::material::BsdfSample;
    use crate::{Camera, Diffuse, Material, Plane, RenderError, Sampler, SceneBuilder, Spd, Sphere};
    use spectra_math::Vec2;
    use spectra_math::Transform;

    fn scene_and_config() -> (Scene, RenderConfig) {
        let config = RenderConfig {
            threads: 2,
            ..RenderConfig::default().with_resolution(16, 12).with_quality(4, 4)
        };
        let grey: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::constant(0.5)));
        let mut builder = SceneBuilder::new();
        builder
            .add_shape(
                Arc::new(Sphere::new(1.0)),
                grey.clone(),
                Transform::from_translation(Vec3::new(0.0, 0.0, -3.0)),
            )
            .add_shape(
                Arc::new(Plane::new()),
                grey,
                Transform::from_scale_rotation_translation(
                    Vec3::splat(20.0),
                    spectra_math::Quat::IDENTITY,
                    Vec3::new(0.0, -1.0, 0.0),
                ),
            );
        let scene = builder.build(&config).unwrap();
        (scene, config)
    }

    #[test]
    fn test_batch_render_commits_every_sample() {
        let (scene, config) = scene_and_config();
        let mut renderer = Renderer::new(config.clone(), scene).unwrap();
        let stats = renderer.render(&CancelFlag::new());

        assert!(stats.completed);
        assert_eq!(stats.samples_committed + stats.samples_discarded, 16 * 12 * 4);
        assert_eq!(stats.samples_discarded, 0);
        assert_eq!(renderer.render_progress(), 1.0);
        assert_eq!(renderer.layer().samples(8, 6), 4);

        let output = renderer.export();
        assert_eq!(output.color.len(), 16 * 12 * 3);
        assert!(output.color.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        assert!(output.depth.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_batch_render_is_deterministic() {
        let (scene_a, config) = scene_and_config();
        let (scene_b, _) = scene_and_config();
        let mut a = Renderer::new(config.clone(), scene_a).unwrap();
        let mut b = Renderer::new(
            RenderConfig {
                threads: 1,
                ..config
            },
            scene_b,
        )
        .unwrap();
        a.render(&CancelFlag::new());
        b.render(&CancelFlag::new());
        assert_eq!(a.export(), b.export());
    }

    #[test]
    fn test_progressive_passes_accumulate() {
        let (scene, config) = scene_and_config();
        let mut renderer = Renderer::new(config, scene).unwrap();
        let cancel = CancelFlag::new();
        for _ in 0..3 {
            renderer.render_progressive_pass(&cancel);
        }
        assert_eq!(renderer.passes(), 3);
        assert_eq!(renderer.layer().total_samples() as usize, 16 * 12 * 3);

        renderer.update_camera(CameraUpdate::Move(Vec3::X)).unwrap();
        assert_eq!(renderer.passes(), 0);
        assert_eq!(renderer.layer().total_samples(), 0);
    }

    #[test]
    fn test_cancel_before_start_commits_nothing() {
        let (scene, config) = scene_and_config();
        let mut renderer = Renderer::new(config, scene).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let stats = renderer.render(&cancel);
        assert!(!stats.completed);
        assert_eq!(stats.samples_committed, 0);
        assert_eq!(renderer.render_progress(), 0.0);
    }

    #[test]
    fn test_set_config_rejects_invalid_and_keeps_old() {
        let (scene, config) = scene_and_config();
        let mut renderer = Renderer::new(config, scene).unwrap();
        let bad = renderer.config().clone().with_quality(0, 4);
        assert!(renderer.set_config(bad).is_err());
        assert_eq!(renderer.config().samples, 4);

        let mut resized = renderer.config().clone().with_resolution(8, 8);
        resized.sky.kind = SkyKind::Gradient;
        renderer.set_config(resized).unwrap();
        renderer.render(&CancelFlag::new());
        assert_eq!(renderer.export().color.len(), 8 * 8 * 3);
    }

    #[test]
    fn test_rejected_sky_keeps_renderer_usable() {
        let (scene, config) = scene_and_config();
        let mut renderer = Renderer::new(config, scene).unwrap();

        let mut missing_sky = renderer.config().clone().with_resolution(8, 8);
        missing_sky.sky.kind = SkyKind::Image;
        missing_sky.threads = 3;
        assert!(matches!(
            renderer.set_config(missing_sky),
            Err(RenderError::Config(ConfigError::MissingSkyImage))
        ));
        assert_eq!(renderer.config().width, 16);
        assert_eq!(renderer.scene().camera().frame().resolution(), (16, 12));

        let stats = renderer.render(&CancelFlag::new());
        assert!(stats.completed);
        assert_eq!(stats.samples_committed, 16 * 12 * 4);
        assert_eq!(renderer.export().color.len(), 16 * 12 * 3);
    }

    /// Reflects with a NaN BSDF value, poisoning every path that touches it.
    struct NanMaterial;

    impl Material for NanMaterial {
        fn sample_direction(&self, _wo: Vec3, _lambda: f32, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
            let wi = spectra_math::sampling::cosine_sample_hemisphere(sampler.next_2d());
            Some(BsdfSample { wi, f: f32::NAN, pdf: 1.0 })
        }

        fn eval(&self, _wo: Vec3, _wi: Vec3, _lambda: f32) -> f32 {
            f32::NAN
        }
    }

    #[test]
    fn test_degenerate_samples_are_discarded() {
        let config = RenderConfig {
            threads: 2,
            ..RenderConfig::default().with_resolution(8, 8).with_quality(4, 4)
        };
        let mut builder = SceneBuilder::new();
        builder.add_shape(
            Arc::new(Sphere::new(1.0)),
            Arc::new(NanMaterial),
            Transform::from_translation(Vec3::new(0.0, 0.0, -3.0)),
        );
        let scene = builder.build(&config).unwrap();
        let mut renderer = Renderer::new(config, scene).unwrap();
        let stats = renderer.render(&CancelFlag::new());

        assert!(stats.completed);
        assert!(stats.samples_discarded > 0);
        assert!(stats.samples_committed > 0);
        assert_eq!(stats.samples_committed + stats.samples_discarded, 8 * 8 * 4);
        assert_eq!(renderer.layer().total_samples(), stats.samples_committed);
        assert!(renderer.export().color.iter().all(|v| v.is_finite()));
    }

    /// Pinhole camera that has no ray for the left half of the film.
    struct HalfBlindCamera(PinholeCamera);

    impl Camera for HalfBlindCamera {
        fn frame(&self) -> &CameraFrame {
            self.0.frame()
        }

        fn frame_mut(&mut self) -> &mut CameraFrame {
            self.0.frame_mut()
        }

        fn generate_ray(&self, film_pos: Vec2, lambda: f32, sampler: &mut dyn Sampler) -> Option<CameraRay> {
            if film_pos.x < 0.0 {
                return None;
            }
            self.0.generate_ray(film_pos, lambda, sampler)
        }
    }

    #[test]
    fn test_missing_camera_ray_commits_black_sample() {
        let (mut scene, config) = scene_and_config();
        let pinhole = PinholeCamera::new(*scene.camera().frame(), config.camera.fov);
        scene.set_camera(Box::new(HalfBlindCamera(pinhole)));
        let mut renderer = Renderer::new(config, scene).unwrap();
        let stats = renderer.render(&CancelFlag::new());

        assert_eq!(stats.samples_committed, 16 * 12 * 4);
        assert_eq!(stats.samples_discarded, 0);
        assert_eq!(renderer.layer().samples(0, 6), 4);
        assert_eq!(renderer.layer().color(0, 6), Color::ZERO);
        assert_eq!(renderer.layer().depth(0, 6), None);
        assert!(renderer.layer().color(15, 0).length() > 0.0);
    }

    #[test]
    fn test_degenerate_look_at_is_rejected() {
        let (scene, config) = scene_and_config();
        let mut renderer = Renderer::new(config, scene).unwrap();
        let update = CameraUpdate::LookAt {
            look_from: Vec3::ZERO,
            look_at: Vec3::Y,
            up: Vec3::Y,
        };
        assert!(renderer.update_camera(update).is_err());
    }
}
