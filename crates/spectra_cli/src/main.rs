//! Spectra command line renderer.
//!
//! Renders the built-in demo scene and writes one PNG per output layer.

mod demo;

use anyhow::{bail, Context, Result};
use clap::Parser;
use spectra_renderer::config::{CameraKind, IntegratorKind, RenderMode, SkyKind};
use spectra_renderer::{
    ImageSky, LayerKind, RenderConfig, RenderOutput, RenderRequest, RenderService, Renderer, Vec3,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Spectral Monte Carlo renderer", long_about = None)]
struct Args {
    /// JSON render configuration; flags override its values
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PIXELS")]
    width: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    height: Option<u32>,

    /// Samples per pixel (batch mode)
    #[arg(long, short = 's', value_name = "NUM")]
    samples: Option<u32>,

    /// Maximum path segments
    #[arg(long, value_name = "NUM")]
    max_depth: Option<u32>,

    /// Integrator: pt or nee
    #[arg(long)]
    integrator: Option<IntegratorKind>,

    /// Camera: pinhole, thin_lens or environment
    #[arg(long)]
    camera: Option<CameraKind>,

    /// Render mode: batch or progressive
    #[arg(long)]
    mode: Option<RenderMode>,

    /// Progressive passes to accumulate
    #[arg(long, default_value_t = 16, value_name = "NUM")]
    passes: u32,

    /// Equirectangular environment image used as the sky
    #[arg(long, value_name = "FILE")]
    sky_image: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(long, short = 't', value_name = "NUM")]
    threads: Option<usize>,

    #[arg(long, value_name = "NUM")]
    seed: Option<u64>,

    /// Directory for the output images
    #[arg(long, short = 'o', default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// File name prefix for the output images
    #[arg(long, default_value = "spectra")]
    prefix: String,

    /// Only write the color layer
    #[arg(long)]
    color_only: bool,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => {
                let mut config = RenderConfig::default();
                config.camera.look_from = demo::LOOK_FROM;
                config.camera.look_at = demo::LOOK_AT;
                config.camera.fov = 60.0;
                config.sky.kind = SkyKind::Gradient;
                config.sky.scale = 0.5;
                config
            }
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(integrator) = self.integrator {
            config.integrator = integrator;
        }
        if let Some(camera) = self.camera {
            config.camera.kind = camera;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.sky_image.is_some() {
            config.sky.kind = SkyKind::Image;
        }
        // Keep the film aspect in line with the image
        config.film_height = config.film_width * config.height as f32 / config.width.max(1) as f32;

        config.validate()?;
        Ok(config)
    }
}

fn load_sky_image(path: &Path) -> Result<ImageSky> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open sky image {}", path.display()))?
        .to_rgb32f();
    let (width, height) = image.dimensions();
    let texels = image
        .pixels()
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    log::info!("Loaded {}x{} sky image from {}", width, height, path.display());
    Ok(ImageSky::new(width as usize, height as usize, texels)?)
}

fn write_layers(output: &RenderOutput, args: &Args) -> Result<()> {
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let layers: &[LayerKind] = if args.color_only {
        &[LayerKind::Color]
    } else {
        &LayerKind::ALL
    };
    for &kind in layers {
        let path = args.output_dir.join(format!("{}_{}.png", args.prefix, kind));
        image::save_buffer(
            &path,
            &output.to_rgb8(kind),
            output.width,
            output.height,
            image::ColorType::Rgb8,
        )
        .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = args.render_config()?;
    log::info!(
        "Rendering {}x{} in {} mode with {} integrator",
        config.width,
        config.height,
        config.mode,
        config.integrator
    );

    let mut builder = demo::build();
    if let Some(path) = &args.sky_image {
        builder.sky_image(load_sky_image(path)?);
    }
    let scene = builder.build(&config)?;
    let renderer = Renderer::new(config.clone(), scene)?;
    let service = RenderService::spawn(renderer)?;

    let request = match config.mode {
        RenderMode::Batch => RenderRequest::Render,
        RenderMode::Progressive => RenderRequest::Progressive { passes: args.passes },
    };
    let handle = service.submit(request)?;

    let outcome = loop {
        if let Some(result) = handle.try_result() {
            break result?;
        }
        log::debug!("Progress {:.0}%", handle.progress() * 100.0);
        std::thread::sleep(Duration::from_millis(500));
    };

    let Some(stats) = outcome.stats() else {
        bail!("Render request finished without an image");
    };
    log::info!(
        "Finished after {} pass(es) in {:.2}s: {} samples, {} discarded",
        stats.passes,
        stats.elapsed.as_secs_f64(),
        stats.samples_committed,
        stats.samples_discarded
    );
    if let Some(output) = outcome.output() {
        write_layers(output, &args)?;
    }

    service.shutdown()?;
    Ok(())
}
