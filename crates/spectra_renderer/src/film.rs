//! Spectral accumulation buffer.

use crate::{Color, Spd};

/// Per-pixel spectra holding the summed flux of all committed samples.
#[derive(Debug, Clone)]
pub struct Film {
    width: u32,
    height: u32,
    pixels: Vec<Spd>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Spd::zero(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every pixel to zero flux.
    pub fn clear(&mut self) {
        self.pixels.fill(Spd::zero());
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) outside film");
        y as usize * self.width as usize + x as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> &Spd {
        &self.pixels[self.index(x, y)]
    }

    /// Deposit flux `phi` at `lambda` into pixel `(x, y)`.
    pub fn add_phi(&mut self, x: u32, y: u32, lambda: f32, phi: f32) {
        let index = self.index(x, y);
        self.pixels[index].add_phi(lambda, phi);
    }

    /// Add a whole spectrum into pixel `(x, y)`.
    pub fn accumulate(&mut self, x: u32, y: u32, spd: &Spd) {
        let index = self.index(x, y);
        self.pixels[index] += spd;
    }

    /// Linear sRGB of the average sample in pixel `(x, y)`.
    pub fn resolve(&self, x: u32, y: u32, samples: u32) -> Color {
        if samples == 0 {
            return Color::ZERO;
        }
        self.pixel(x, y).to_rgb() / samples as f32
    }
}
