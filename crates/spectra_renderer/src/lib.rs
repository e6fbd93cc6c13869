//! Spectra - spectral Monte Carlo path tracer.
//!
//! Paths are traced at a single sampled wavelength and deposited into
//! per-pixel spectra, which are converted to color only for display.
//! Rendering is split into buckets that run in parallel on a rayon pool,
//! either as one batch pass or as progressive single-sample passes.

mod bucket;
mod bvh;
mod camera;
pub mod config;
mod error;
mod executor;
mod film;
mod integrator;
mod intersector;
mod layer;
mod light;
mod material;
mod plane;
mod primitive;
mod ray;
mod renderer;
mod sampler;
mod scene;
mod service;
mod shape;
mod sky;
pub mod spectrum;
mod sphere;
mod tonemap;
mod triangle;

pub use bucket::{generate_buckets, Bucket, BucketResult, PixelAccum};
pub use bvh::BvhIntersector;
pub use camera::{
    create_camera, Camera, CameraFrame, CameraRay, EnvironmentCamera, PinholeCamera, ThinLensCamera,
};
pub use config::{RenderConfig, RenderMode};
pub use error::{ConfigError, RenderError, RenderResult};
pub use executor::TileExecutor;
pub use film::Film;
pub use integrator::{
    create_integrator, FirstHit, Integrator, NeeIntegrator, PathSample, PathTracer, RussianRoulette,
};
pub use intersector::{Intersector, LinearIntersector};
pub use layer::{LayerKind, RenderLayer};
pub use light::{AreaLight, Light};
pub use material::{fresnel_dielectric, BsdfSample, Diffuse, Glass, Material, Mirror, Sellmeier};
pub use plane::Plane;
pub use primitive::{IntersectInfo, Primitive};
pub use ray::{Ray, RAY_EPSILON};
pub use renderer::{
    CameraUpdate, CancelFlag, RenderOutput, RenderProgress, RenderStats, Renderer,
};
pub use sampler::{
    create_sampler, pixel_sample_seed, pixel_seed, PcgSampler, RandomSampler, Sampler, StdSampler,
};
pub use scene::{Scene, SceneBuilder};
pub use service::{RenderHandle, RenderOutcome, RenderRequest, RenderService};
pub use shape::{Shape, ShapeHit, SurfaceSample};
pub use sky::{create_sky, GradientSky, ImageSky, Sky, UniformSky};
pub use spectrum::{Color, Spd};
pub use sphere::Sphere;
pub use triangle::{Triangle, TriangleMesh};

/// Re-export the math types the public API is written in
pub use spectra_math::{Aabb, Frame, Interval, Transform, Vec2, Vec3};
