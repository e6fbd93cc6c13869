//! Discretized spectral power distributions.
//!
//! Every [`Spd`] shares the same bins: `LAMBDA_SAMPLES` equal-width bins
//! starting at `LAMBDA_MIN`. Bin `i` sits at `LAMBDA_MIN + i * LAMBDA_STEP`.
//! Film pixels store flux integrated over each bin, which is what
//! [`Spd::to_xyz`] expects; reflectance and emission spectra are sampled
//! pointwise with [`Spd::sample`].

mod cie;

pub use cie::cie_xyz;

use spectra_math::Vec3;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Sub, SubAssign};
use std::sync::OnceLock;

/// Shortest wavelength in nanometers.
pub const LAMBDA_MIN: f32 = 380.0;

/// Longest wavelength in nanometers.
pub const LAMBDA_MAX: f32 = 780.0;

/// Number of wavelength bins.
pub const LAMBDA_SAMPLES: usize = 80;

/// Bin width in nanometers.
pub const LAMBDA_STEP: f32 = (LAMBDA_MAX - LAMBDA_MIN) / LAMBDA_SAMPLES as f32;

/// Density of a wavelength drawn uniformly from `[LAMBDA_MIN, LAMBDA_MAX)`.
pub const LAMBDA_PDF: f32 = 1.0 / (LAMBDA_MAX - LAMBDA_MIN);

/// Linear RGB or XYZ triple.
pub type Color = Vec3;

/// Draw a wavelength uniformly from the visible range. `u` is in `[0, 1)`.
#[inline]
pub fn sample_wavelength(u: f32) -> f32 {
    (LAMBDA_MIN + u * (LAMBDA_MAX - LAMBDA_MIN)).min(LAMBDA_MAX - 1e-3)
}

/// Wavelength of bin `i` in nanometers.
#[inline]
pub fn bin_wavelength(i: usize) -> f32 {
    LAMBDA_MIN + i as f32 * LAMBDA_STEP
}

/// Lower bin index and interpolation weight of the upper bin for `lambda`.
#[inline]
fn bracket(lambda: f32) -> (usize, usize, f32) {
    assert!(
        (LAMBDA_MIN..LAMBDA_MAX).contains(&lambda),
        "wavelength {lambda} nm outside [{LAMBDA_MIN}, {LAMBDA_MAX})"
    );
    let x = (lambda - LAMBDA_MIN) / LAMBDA_STEP;
    let i0 = (x as usize).min(LAMBDA_SAMPLES - 1);
    let i1 = (i0 + 1).min(LAMBDA_SAMPLES - 1);
    (i0, i1, x - i0 as f32)
}

/// A spectral power distribution over the fixed wavelength bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Spd {
    phi: [f32; LAMBDA_SAMPLES],
}

impl Spd {
    pub fn zero() -> Self {
        Self {
            phi: [0.0; LAMBDA_SAMPLES],
        }
    }

    pub fn constant(value: f32) -> Self {
        Self {
            phi: [value; LAMBDA_SAMPLES],
        }
    }

    /// Evaluate `f` at each bin wavelength.
    pub fn from_fn(f: impl Fn(f32) -> f32) -> Self {
        Self {
            phi: std::array::from_fn(|i| f(bin_wavelength(i))),
        }
    }

    /// Approximate reflectance spectrum for a linear RGB color.
    pub fn from_rgb(rgb: Color) -> Self {
        Self::from_fn(|lambda| rgb_to_spectral(rgb, lambda))
    }

    /// Planck spectrum at `kelvin`, scaled so its peak is 1.
    pub fn blackbody(kelvin: f32) -> Self {
        assert!(kelvin > 0.0, "blackbody temperature must be positive");
        let peak_nm = 2.897_772e6 / kelvin;
        let peak = planck(peak_nm, kelvin);
        Self::from_fn(|lambda| planck(lambda, kelvin) / peak)
    }

    pub fn values(&self) -> &[f32; LAMBDA_SAMPLES] {
        &self.phi
    }

    /// Sum of all bins.
    pub fn sum(&self) -> f32 {
        self.phi.iter().sum()
    }

    pub fn max_value(&self) -> f32 {
        self.phi.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn is_black(&self) -> bool {
        self.phi.iter().all(|&v| v == 0.0)
    }

    /// Linearly interpolated value at `lambda`.
    ///
    /// # Panics
    /// If `lambda` is outside `[LAMBDA_MIN, LAMBDA_MAX)`.
    pub fn sample(&self, lambda: f32) -> f32 {
        let (i0, i1, t) = bracket(lambda);
        self.phi[i0] * (1.0 - t) + self.phi[i1] * t
    }

    /// Deposit flux `phi` at `lambda`, split between the two nearest bins.
    ///
    /// # Panics
    /// If `lambda` is outside `[LAMBDA_MIN, LAMBDA_MAX)`.
    pub fn add_phi(&mut self, lambda: f32, phi: f32) {
        let (i0, i1, t) = bracket(lambda);
        if i0 == i1 {
            self.phi[i0] += phi;
        } else {
            self.phi[i0] += phi * (1.0 - t);
            self.phi[i1] += phi * t;
        }
    }

    /// CIE XYZ of the bin fluxes. A flat spectrum of per-bin flux `v * LAMBDA_STEP`
    /// yields `Y = v`.
    pub fn to_xyz(&self) -> Color {
        let mut xyz = Color::ZERO;
        for (i, &phi) in self.phi.iter().enumerate() {
            if phi == 0.0 {
                continue;
            }
            let [x, y, z] = cie_xyz(bin_wavelength(i));
            xyz += phi * Color::new(x, y, z);
        }
        xyz / cie_y_integral()
    }

    /// Linear sRGB (D65) of the bin fluxes.
    pub fn to_rgb(&self) -> Color {
        xyz_to_rgb(self.to_xyz())
    }
}

impl Default for Spd {
    fn default() -> Self {
        Self::zero()
    }
}

impl Index<usize> for Spd {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.phi[i]
    }
}

macro_rules! spd_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $assign_trait<&Spd> for Spd {
            fn $assign_method(&mut self, rhs: &Spd) {
                for (a, b) in self.phi.iter_mut().zip(rhs.phi.iter()) {
                    *a = *a $op *b;
                }
            }
        }

        impl $assign_trait<Spd> for Spd {
            fn $assign_method(&mut self, rhs: Spd) {
                *self = self.clone() $op &rhs;
            }
        }

        impl $assign_trait<f32> for Spd {
            fn $assign_method(&mut self, rhs: f32) {
                for a in self.phi.iter_mut() {
                    *a = *a $op rhs;
                }
            }
        }

        impl $trait<&Spd> for Spd {
            type Output = Spd;

            fn $method(mut self, rhs: &Spd) -> Spd {
                for (a, b) in self.phi.iter_mut().zip(rhs.phi.iter()) {
                    *a = *a $op *b;
                }
                self
            }
        }

        impl $trait<Spd> for Spd {
            type Output = Spd;

            fn $method(self, rhs: Spd) -> Spd {
                self $op &rhs
            }
        }

        impl $trait<f32> for Spd {
            type Output = Spd;

            fn $method(mut self, rhs: f32) -> Spd {
                for a in self.phi.iter_mut() {
                    *a = *a $op rhs;
                }
                self
            }
        }
    };
}

spd_binary_op!(Add, add, AddAssign, add_assign, +);
spd_binary_op!(Sub, sub, SubAssign, sub_assign, -);
spd_binary_op!(Mul, mul, MulAssign, mul_assign, *);
spd_binary_op!(Div, div, DivAssign, div_assign, /);

/// Normalization so a flat unit-density spectrum has `Y = 1`.
fn cie_y_integral() -> f32 {
    static INTEGRAL: OnceLock<f32> = OnceLock::new();
    *INTEGRAL.get_or_init(|| {
        (0..LAMBDA_SAMPLES)
            .map(|i| cie_xyz(bin_wavelength(i))[1] * LAMBDA_STEP)
            .sum()
    })
}

/// CIE XYZ to linear sRGB with a D65 white point.
pub fn xyz_to_rgb(xyz: Color) -> Color {
    Color::new(
        3.240_454_2 * xyz.x - 1.537_138_5 * xyz.y - 0.498_531_4 * xyz.z,
        -0.969_266 * xyz.x + 1.876_010_8 * xyz.y + 0.041_556 * xyz.z,
        0.055_643_4 * xyz.x - 0.204_025_9 * xyz.y + 1.057_225_2 * xyz.z,
    )
}

/// Value at `lambda` of a smooth three-band upsampling of `rgb`.
///
/// The band weights sum to one everywhere, so white maps to a flat spectrum
/// and colors in `[0, 1]` stay valid reflectances.
pub fn rgb_to_spectral(rgb: Color, lambda: f32) -> f32 {
    let blue = 1.0 - smoothstep(480.0, 510.0, lambda);
    let red = smoothstep(570.0, 600.0, lambda);
    let green = (1.0 - blue - red).max(0.0);
    rgb.x * red + rgb.y * green + rgb.z * blue
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Spectral radiance of a blackbody at `lambda_nm`, in arbitrary units.
fn planck(lambda_nm: f32, kelvin: f32) -> f32 {
    const C2: f64 = 1.438_776_9e7; // hc/k in nm*K
    let lambda = lambda_nm as f64;
    let value = 1.0 / (lambda.powi(5) * ((C2 / (lambda * kelvin as f64)).exp() - 1.0));
    (value * 1e15) as f32
}
