//! Bucket-based tile rendering.
//!
//! Divides the image into a grid of tiles (buckets) that are rendered
//! independently and in parallel, then merged into the film.

use crate::integrator::PathSample;
use crate::renderer::{render_pixel, PassContext};
use crate::Spd;
use spectra_math::Vec3;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Image coordinates of the bucket's pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height).flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

/// Split `width`x`height` into a `tiles_x` by `tiles_y` grid, sorted center-out.
///
/// Tile edges are spread evenly so widths differ by at most one pixel. Tile
/// counts larger than the image dimension are clamped so no tile is empty.
pub fn generate_buckets(width: u32, height: u32, tiles_x: u32, tiles_y: u32) -> Vec<Bucket> {
    let tiles_x = tiles_x.clamp(1, width.max(1));
    let tiles_y = tiles_y.clamp(1, height.max(1));
    let edge = |i: u32, tiles: u32, size: u32| (i as u64 * size as u64 / tiles as u64) as u32;

    let mut buckets = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = (edge(ty, tiles_y, height), edge(ty + 1, tiles_y, height));
        for tx in 0..tiles_x {
            let (x0, x1) = (edge(tx, tiles_x, width), edge(tx + 1, tiles_x, width));
            if x1 > x0 && y1 > y0 {
                buckets.push(Bucket::new(x0, y0, x1 - x0, y1 - y0, buckets.len()));
            }
        }
    }

    sort_spiral(&mut buckets, width, height);
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }
    buckets
}

/// Sort buckets by distance from the image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let dist = |b: &Bucket| {
        let cx = b.x as f32 + b.width as f32 / 2.0;
        let cy = b.y as f32 + b.height as f32 / 2.0;
        (cx - center_x).powi(2) + (cy - center_y).powi(2)
    };
    // Stable sort keeps row-major order between equidistant tiles
    buckets.sort_by(|a, b| dist(a).total_cmp(&dist(b)));
}

/// Everything one pixel contributed during a pass.
#[derive(Debug, Clone, Default)]
pub struct PixelAccum {
    /// Summed flux per wavelength bin
    pub spectrum: Spd,
    pub normal: Vec3,
    pub position: Vec3,
    pub depth: f32,
    pub direction: Vec3,
    /// Committed samples whose camera ray hit geometry
    pub hits: u32,
    /// Committed samples
    pub samples: u32,
    /// Degenerate samples that were dropped
    pub discarded: u32,
}

impl PixelAccum {
    /// Commit one sample with flux `phi` at `lambda`.
    pub fn commit(&mut self, lambda: f32, phi: f32, path: &PathSample) {
        self.spectrum.add_phi(lambda, phi);
        self.direction += path.direction;
        if let Some(hit) = path.first_hit {
            self.normal += hit.normal;
            self.position += hit.position;
            self.depth += hit.depth;
            self.hits += 1;
        }
        self.samples += 1;
    }

    /// Commit a sample that carries no light and no geometry.
    pub fn commit_empty(&mut self) {
        self.samples += 1;
    }
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Per-pixel accumulations in row-major order; shorter than the bucket if cancelled
    pub pixels: Vec<PixelAccum>,
    /// Whether every pixel finished all of its samples
    pub completed: bool,
}

impl BucketResult {
    pub fn samples(&self) -> u64 {
        self.pixels.iter().map(|p| p.samples as u64).sum()
    }

    pub fn discarded(&self) -> u64 {
        self.pixels.iter().map(|p| p.discarded as u64).sum()
    }

    /// Image coordinates paired with each accumulated pixel.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), &PixelAccum)> + '_ {
        self.bucket.pixels().zip(&self.pixels)
    }
}

/// Render every pixel of `bucket`, stopping early on cancellation.
pub fn render_bucket(bucket: &Bucket, ctx: &PassContext<'_>) -> BucketResult {
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);
    let mut completed = true;

    for (x, y) in bucket.pixels() {
        if ctx.cancel.is_cancelled() {
            completed = false;
            break;
        }
        let (accum, finished) = render_pixel(ctx, x, y);
        pixels.push(accum);
        if finished {
            ctx.progress.pixel_done();
        } else {
            completed = false;
            break;
        }
    }

    log::debug!(
        "Bucket {} at ({}, {}) {}x{}: {} pixels{}",
        bucket.index,
        bucket.x,
        bucket.y,
        bucket.width,
        bucket.height,
        pixels.len(),
        if completed { "" } else { " (cancelled)" }
    );

    BucketResult { bucket: *bucket, pixels, completed }
}
