// End-to-end renders of a small scene through the public API.

use spectra_renderer::config::{IntegratorKind, RenderMode, SkyKind};
use spectra_renderer::{
    CancelFlag, Diffuse, Material, Plane, RenderConfig, Renderer, Scene, SceneBuilder, Spd, Sphere,
    Transform, Vec3,
};
use std::sync::Arc;
use std::time::Duration;

/// Grey sphere of radius 1 at (0, 0, -3) resting on a large ground square.
fn sphere_on_ground(config: &RenderConfig) -> Scene {
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
                Vec3::new(100.0, 1.0, 100.0),
                Default::default(),
                Vec3::new(0.0, -1.0, 0.0),
            ),
        );
    builder.build(config).expect("valid scene")
}

fn base_config() -> RenderConfig {
    let mut config = RenderConfig::default().with_resolution(32, 24).with_quality(16, 8);
    config.threads = 4;
    config.camera.fov = 90.0;
    config.sky.kind = SkyKind::Uniform;
    config.sky.color = Vec3::ONE;
    config
}

fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

/// Average luminance over a pixel rectangle.
fn mean_luminance(renderer: &Renderer, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> f32 {
    let count = (xs.len() * ys.len()) as f32;
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .map(|(x, y)| luminance(renderer.pixel_color(x, y)))
        .sum::<f32>()
        / count
}

#[test]
fn sphere_on_ground_renders_finite_image() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = base_config();
    let mut renderer = Renderer::new(config.clone(), sphere_on_ground(&config)).unwrap();
    let stats = renderer.render(&CancelFlag::new());
    assert!(stats.completed);
    assert_eq!(renderer.render_progress(), 1.0);

    for y in 0..config.height {
        for x in 0..config.width {
            let c = renderer.pixel_color(x, y);
            assert!(c.is_finite(), "pixel ({x}, {y}) = {c}");
        }
    }

    let output = renderer.export();
    assert!(output.color.iter().all(|v| v.is_finite() && *v >= 0.0));

    // The top row looks past the sphere into the sky; the center sees the sphere
    let sky = mean_luminance(&renderer, 0..32, 0..1);
    let center = mean_luminance(&renderer, 14..18, 10..14);
    assert!(sky > 0.8, "sky luminance {sky}");
    assert!(center < 0.8 * sky, "center luminance {center}");

    let depth = renderer.layer().depth(16, 12).expect("center hits the sphere");
    assert!((depth - 2.0).abs() < 0.1, "center depth {depth}");
    let normal = renderer.layer().normal(16, 12).unwrap();
    assert!(normal.z > 0.9, "center normal {normal}");
    assert_eq!(renderer.layer().depth(16, 0), None);
}

#[test]
fn nee_and_path_tracing_agree() {
    let mut config = base_config().with_quality(64, 8);
    let mut means = Vec::new();
    for integrator in [IntegratorKind::PathTracer, IntegratorKind::Nee] {
        config.integrator = integrator;
        let mut renderer = Renderer::new(config.clone(), sphere_on_ground(&config)).unwrap();
        renderer.render(&CancelFlag::new());
        means.push(mean_luminance(&renderer, 0..config.width, 0..config.height));
    }
    // No emitters: both estimate the same sky-lit image
    assert!((means[0] - means[1]).abs() < 0.03, "{means:?}");
}

#[test]
fn progressive_mode_matches_batch() {
    let mut config = base_config().with_resolution(16, 12).with_quality(32, 8);
    let mut batch = Renderer::new(config.clone(), sphere_on_ground(&config)).unwrap();
    batch.render(&CancelFlag::new());

    config.mode = RenderMode::Progressive;
    let mut progressive = Renderer::new(config.clone(), sphere_on_ground(&config)).unwrap();
    let cancel = CancelFlag::new();
    for pass in 1..=32 {
        let stats = progressive.render_configured(&cancel);
        assert_eq!(stats.passes, pass);
    }
    assert_eq!(progressive.layer().samples(8, 6), 32);

    let batch_mean = mean_luminance(&batch, 0..16, 0..12);
    let progressive_mean = mean_luminance(&progressive, 0..16, 0..12);
    assert!(
        (batch_mean - progressive_mean).abs() < 0.05,
        "batch {batch_mean}, progressive {progressive_mean}"
    );
}

#[test]
fn cancellation_stops_pass_early() {
    let config = base_config().with_resolution(256, 192).with_quality(256, 8);
    let mut renderer = Renderer::new(config.clone(), sphere_on_ground(&config)).unwrap();
    let progress = renderer.progress_tracker();
    let cancel = CancelFlag::new();

    let stats = std::thread::scope(|scope| {
        let worker = scope.spawn(|| renderer.render(&cancel));

        let mut last = 0.0;
        while !worker.is_finished() {
            let fraction = progress.fraction();
            assert!(fraction >= last, "progress went backwards: {last} -> {fraction}");
            last = fraction;
            if fraction > 0.02 {
                cancel.cancel();
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        worker.join().unwrap()
    });

    assert!(!stats.completed);
    assert!(renderer.render_progress() < 1.0);
    assert!(stats.samples_committed < (256 * 192 * 256) as u64);

    // Everything committed before the cancel is kept and finite
    assert!(renderer.layer().total_samples() > 0);
    assert!(renderer.export().color.iter().all(|v| v.is_finite()));
}
