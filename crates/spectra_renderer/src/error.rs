//! Error types for render setup and the render service.

use thiserror::Error;

/// Invalid or unsupported configuration, reported before any rendering starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown {kind} type: {value:?}")]
    UnknownKind { kind: &'static str, value: String },

    #[error("Resolution must be non-zero, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },

    #[error("Samples per pixel must be non-zero")]
    ZeroSamples,

    #[error("Film size must be positive, got {width}x{height}")]
    InvalidFilmSize { width: f32, height: f32 },

    #[error("Russian roulette survival probability must be in (0, 1], got {0}")]
    InvalidSurvivalProbability(f32),

    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("Image sky selected but no image was supplied")]
    MissingSkyImage,

    #[error("Sky image of {width}x{height} needs {} texels, got {texels}", .width * .height)]
    SkyImageSize {
        width: usize,
        height: usize,
        texels: usize,
    },
}

/// Errors surfaced by the renderer and the render service.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to start render thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Render service has shut down")]
    ServiceClosed,

    #[error("Render thread panicked")]
    WorkerPanicked,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
