//! Simple spectral render example.
//!
//! Renders a flint glass sphere over a diffuse floor and saves the color
//! layer to PPM format.

use spectra_renderer::config::{IntegratorKind, SkyKind};
use spectra_renderer::{
    AreaLight, CancelFlag, Diffuse, Glass, LayerKind, Material, Plane, RenderConfig, Renderer,
    SceneBuilder, Sellmeier, Spd, Sphere, Transform, Vec3,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

/// Dense flint glass with strong dispersion.
const SF11: Sellmeier = Sellmeier {
    b: [1.737_597, 0.313_747_35, 1.898_781],
    c: [0.013_188_707, 0.062_306_814, 155.236_29],
};

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut config = RenderConfig::default()
        .with_resolution(400, 300)
        .with_quality(64, 12);
    config.integrator = IntegratorKind::Nee;
    config.camera.look_from = Vec3::new(0.0, 1.0, 2.5);
    config.camera.look_at = Vec3::new(0.0, 0.4, 0.0);
    config.camera.fov = 50.0;
    config.sky.kind = SkyKind::Uniform;
    config.sky.color = Vec3::splat(0.05);

    let floor: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::constant(0.8)));
    let black: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::zero()));
    let mut builder = SceneBuilder::new();
    builder
        .add_shape(
            Arc::new(Plane::new()),
            floor,
            Transform::from_scale(Vec3::new(20.0, 1.0, 20.0)),
        )
        .add_shape(
            Arc::new(Sphere::new(0.5)),
            Arc::new(Glass::new(SF11)),
            Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)),
        )
        .add_emitter(
            Arc::new(Sphere::new(0.1)),
            black,
            Arc::new(AreaLight::new(Spd::blackbody(6500.0)).with_scale(400.0)),
            Transform::from_translation(Vec3::new(-1.5, 2.5, -1.0)),
        );

    let scene = builder.build(&config).expect("valid configuration");
    let mut renderer = Renderer::new(config, scene).expect("renderer");

    let stats = renderer.render(&CancelFlag::new());
    println!(
        "Rendered in {:.2}s ({} samples, {} discarded)",
        stats.elapsed.as_secs_f64(),
        stats.samples_committed,
        stats.samples_discarded
    );

    let output = renderer.export();
    let filename = "output.ppm";
    save_ppm(&output.to_rgb8(LayerKind::Color), output.width, output.height, filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn save_ppm(rgb: &[u8], width: u32, height: u32, filename: &str) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(filename)?);
    writeln!(out, "P6\n{} {}\n255", width, height)?;
    out.write_all(rgb)?;
    Ok(())
}
