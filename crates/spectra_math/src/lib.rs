//! Spectra math - vector types, intervals, bounds, transforms and sampling warps.
//!
//! Vector and matrix types come straight from glam; everything here builds on them.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod frame;
mod interval;
pub mod sampling;
mod transform;

pub use aabb::Aabb;
pub use frame::Frame;
pub use interval::Interval;
pub use transform::Transform;
