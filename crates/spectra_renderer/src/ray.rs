//! Single-wavelength rays.
//!
//! Every path traces one wavelength, so the ray carries it alongside the
//! interval of hit distances that intersectors accept.

use spectra_math::{Interval, Transform, Vec3};

/// Offset applied to `tmin` of secondary rays to avoid self-intersection.
pub const RAY_EPSILON: f32 = 1e-4;

/// A ray with origin, direction, wavelength, and valid `[tmin, tmax]` range.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    origin: Vec3,
    /// Unit length for camera rays; object-space rays inherit the transform's scale
    direction: Vec3,
    /// Nanometers
    lambda: f32,
    t: Interval,
}

impl Ray {
    /// Create a camera ray accepting hits in `[0, inf)`.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, lambda: f32) -> Self {
        Self {
            origin,
            direction,
            lambda,
            t: Interval::new(0.0, f32::INFINITY),
        }
    }

    /// Create a secondary ray leaving a surface, skipping hits closer than [`RAY_EPSILON`].
    #[inline]
    pub fn spawn(origin: Vec3, direction: Vec3, lambda: f32) -> Self {
        Self {
            origin,
            direction,
            lambda,
            t: Interval::new(RAY_EPSILON, f32::INFINITY),
        }
    }

    /// Same ray with a different accepted interval.
    #[inline]
    pub fn with_interval(mut self, t: Interval) -> Self {
        self.t = t;
        self
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Wavelength carried by this path, in nanometers.
    #[inline]
    pub fn lambda(&self) -> f32 {
        self.lambda
    }

    #[inline]
    pub fn interval(&self) -> Interval {
        self.t
    }

    #[inline]
    pub fn tmin(&self) -> f32 {
        self.t.min
    }

    #[inline]
    pub fn tmax(&self) -> f32 {
        self.t.max
    }

    /// Point at distance `t` along the direction.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Map a world-space ray into the local space of `transform`.
    ///
    /// The direction is not renormalized, so hit distances are the same in both spaces.
    #[inline]
    pub fn to_local(&self, transform: &Transform) -> Ray {
        Ray {
            origin: transform.apply_point_inverse(self.origin),
            direction: transform.apply_direction_inverse(self.direction),
            lambda: self.lambda,
            t: self.t,
        }
    }
}
