//! Per-pixel render layers: resolved color plus auxiliary geometry buffers.

use crate::bucket::PixelAccum;
use crate::film::Film;
use crate::Color;
use spectra_math::Vec3;

/// Output layers of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Color,
    Normal,
    Depth,
    Position,
    Direction,
}

impl LayerKind {
    pub const ALL: [LayerKind; 5] = [
        LayerKind::Color,
        LayerKind::Normal,
        LayerKind::Depth,
        LayerKind::Position,
        LayerKind::Direction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Color => "color",
            LayerKind::Normal => "normal",
            LayerKind::Depth => "depth",
            LayerKind::Position => "position",
            LayerKind::Direction => "direction",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Running sums of the auxiliary data and the resolved linear color.
///
/// Normal, position and depth average over samples whose camera ray hit
/// something; direction averages over every committed sample.
#[derive(Debug, Clone)]
pub struct RenderLayer {
    width: u32,
    height: u32,
    color: Vec<Color>,
    normal: Vec<Vec3>,
    position: Vec<Vec3>,
    depth: Vec<f32>,
    direction: Vec<Vec3>,
    hits: Vec<u32>,
    samples: Vec<u32>,
}

impl RenderLayer {
    pub fn new(width: u32, height: u32) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Color::ZERO; n],
            normal: vec![Vec3::ZERO; n],
            position: vec![Vec3::ZERO; n],
            depth: vec![0.0; n],
            direction: vec![Vec3::ZERO; n],
            hits: vec![0; n],
            samples: vec![0; n],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.color.fill(Color::ZERO);
        self.normal.fill(Vec3::ZERO);
        self.position.fill(Vec3::ZERO);
        self.depth.fill(0.0);
        self.direction.fill(Vec3::ZERO);
        self.hits.fill(0);
        self.samples.fill(0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) outside layer");
        y as usize * self.width as usize + x as usize
    }

    /// Fold one pixel's bucket accumulation into the running sums.
    pub fn accumulate(&mut self, x: u32, y: u32, accum: &PixelAccum) {
        let i = self.index(x, y);
        self.normal[i] += accum.normal;
        self.position[i] += accum.position;
        self.depth[i] += accum.depth;
        self.direction[i] += accum.direction;
        self.hits[i] += accum.hits;
        self.samples[i] += accum.samples;
    }

    /// Recompute the color layer from the film's spectra.
    pub fn resolve_color(&mut self, film: &Film) {
        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.index(x, y);
                self.color[i] = film.resolve(x, y, self.samples[i]);
            }
        }
    }

    /// Committed samples in pixel `(x, y)`.
    pub fn samples(&self, x: u32, y: u32) -> u32 {
        self.samples[self.index(x, y)]
    }

    /// Total committed samples over the image.
    pub fn total_samples(&self) -> u64 {
        self.samples.iter().map(|&s| s as u64).sum()
    }

    pub fn color(&self, x: u32, y: u32) -> Color {
        self.color[self.index(x, y)]
    }

    /// Average first-hit normal, or `None` if no sample hit geometry.
    pub fn normal(&self, x: u32, y: u32) -> Option<Vec3> {
        let i = self.index(x, y);
        (self.hits[i] > 0).then(|| self.normal[i].normalize_or_zero())
    }

    pub fn position(&self, x: u32, y: u32) -> Option<Vec3> {
        let i = self.index(x, y);
        (self.hits[i] > 0).then(|| self.position[i] / self.hits[i] as f32)
    }

    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        let i = self.index(x, y);
        (self.hits[i] > 0).then(|| self.depth[i] / self.hits[i] as f32)
    }

    pub fn direction(&self, x: u32, y: u32) -> Vec3 {
        let i = self.index(x, y);
        self.direction[i].normalize_or_zero()
    }

    /// Largest average depth over pixels that saw geometry.
    pub fn max_depth(&self) -> Option<f32> {
        self.depth
            .iter()
            .zip(&self.hits)
            .filter(|(_, &h)| h > 0)
            .map(|(&d, &h)| d / h as f32)
            .filter(|d| d.is_finite())
            .reduce(f32::max)
    }
}
