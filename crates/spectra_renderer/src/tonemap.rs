//! Tone mapping from linear scene RGB to display values.

use crate::config::{ToneMapOperator, ToneMapSettings};
use crate::Color;

/// Narkowicz's fit of the ACES filmic curve.
#[inline]
fn aces(x: f32) -> f32 {
    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
    (x * (a * x + b)) / (x * (c * x + d) + e)
}

impl ToneMapSettings {
    /// Map a linear color to a display-encoded color in `[0, 1]`.
    ///
    /// Negative (out of gamut) components are clipped before the curve.
    pub fn apply(&self, linear: Color) -> Color {
        let exposed = linear.max(Color::ZERO) * self.exposure.exp2();
        let mapped = match self.operator {
            ToneMapOperator::Linear => exposed,
            ToneMapOperator::Reinhard => exposed / (Color::ONE + exposed),
            ToneMapOperator::Aces => Color::new(aces(exposed.x), aces(exposed.y), aces(exposed.z)),
        };
        let inv_gamma = 1.0 / self.gamma;
        mapped
            .clamp(Color::ZERO, Color::ONE)
            .powf(inv_gamma)
    }
}
