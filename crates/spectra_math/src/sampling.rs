//! Warps from the unit square to common sampling domains.
//!
//! All hemisphere functions use +Y as the pole, matching the shading frame.

use crate::{Vec2, Vec3};
use std::f32::consts::{FRAC_1_PI, FRAC_PI_2, FRAC_PI_4, PI};

/// Map the unit square to the unit disk with Shirley's concentric mapping.
pub fn concentric_sample_disk(u: Vec2) -> Vec2 {
    let offset = 2.0 * u - Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return Vec2::ZERO;
    }
    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    r * Vec2::new(theta.cos(), theta.sin())
}

/// Cosine-weighted direction on the +Y hemisphere.
pub fn cosine_sample_hemisphere(u: Vec2) -> Vec3 {
    let d = concentric_sample_disk(u);
    let y = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    Vec3::new(d.x, y, d.y)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: f32) -> f32 {
    cos_theta * FRAC_1_PI
}

/// Uniform direction on the unit sphere.
pub fn uniform_sample_sphere(u: Vec2) -> Vec3 {
    let y = 1.0 - 2.0 * u.x;
    let r = (1.0 - y * y).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3::new(r * phi.cos(), y, r * phi.sin())
}

#[inline]
pub fn uniform_sphere_pdf() -> f32 {
    1.0 / (4.0 * PI)
}

/// Uniform barycentric coordinates `(b0, b1)` over a triangle.
pub fn uniform_sample_triangle(u: Vec2) -> Vec2 {
    let su0 = u.x.sqrt();
    Vec2::new(1.0 - su0, u.y * su0)
}

/// Direction for polar angle `theta` (from +Y) and azimuth `phi` (from +X toward +Z).
pub fn spherical_direction(theta: f32, phi: f32) -> Vec3 {
    let sin_theta = theta.sin();
    Vec3::new(sin_theta * phi.cos(), theta.cos(), sin_theta * phi.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> impl Iterator<Item = Vec2> {
        (0..n).flat_map(move |i| {
            (0..n).map(move |j| Vec2::new((i as f32 + 0.5) / n as f32, (j as f32 + 0.5) / n as f32))
        })
    }

    #[test]
    fn test_disk_samples_inside_unit_disk() {
        for u in grid(16) {
            assert!(concentric_sample_disk(u).length() <= 1.0 + 1e-5);
        }
        assert_eq!(concentric_sample_disk(Vec2::splat(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_cosine_hemisphere_is_upper_and_unit() {
        let mut mean_cos = 0.0;
        let n = 64;
        for u in grid(n) {
            let d = cosine_sample_hemisphere(u);
            assert!(d.y >= 0.0);
            assert!((d.length() - 1.0).abs() < 1e-4);
            mean_cos += d.y;
        }
        // E[cos] under cos/pi is 2/3
        mean_cos /= (n * n) as f32;
        assert!((mean_cos - 2.0 / 3.0).abs() < 0.01, "mean cos {mean_cos}");
    }

    #[test]
    fn test_uniform_sphere_is_balanced() {
        let mut sum = Vec3::ZERO;
        let n = 64;
        for u in grid(n) {
            let d = uniform_sample_sphere(u);
            assert!((d.length() - 1.0).abs() < 1e-4);
            sum += d;
        }
        assert!((sum / (n * n) as f32).length() < 0.01);
    }

    #[test]
    fn test_triangle_barycentrics_valid() {
        for u in grid(16) {
            let b = uniform_sample_triangle(u);
            assert!(b.x >= 0.0 && b.y >= 0.0 && b.x + b.y <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn test_spherical_direction_pole() {
        assert!((spherical_direction(0.0, 1.3) - Vec3::Y).length() < 1e-6);
    }
}
