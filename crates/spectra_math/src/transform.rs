// Affine local <-> world transforms.
//
// The inverse is computed once at construction and kept next to the forward
// matrix: points and directions use one operator, normals use the inverse
// transpose, and both directions are needed on every intersection.

use crate::{Aabb, Mat3, Mat4, Quat, Vec3};
use std::ops::Mul;

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-12;

/// An affine transform stored together with its exact inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    mat: Mat4,
    inv: Mat4,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        mat: Mat4::IDENTITY,
        inv: Mat4::IDENTITY,
    };

    /// Wrap an affine matrix.
    ///
    /// # Panics
    /// If the matrix is singular or contains non-finite values.
    pub fn new(mat: Mat4) -> Self {
        let det = mat.determinant();
        assert!(
            det.is_finite() && det.abs() > SINGULAR_EPSILON,
            "transform matrix is singular (det = {det})"
        );
        Self {
            mat,
            inv: mat.inverse(),
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            mat: Mat4::from_translation(t),
            inv: Mat4::from_translation(-t),
        }
    }

    pub fn from_scale(s: Vec3) -> Self {
        Self::new(Mat4::from_scale(s))
    }

    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self::new(Mat4::from_scale_rotation_translation(scale, rotation, translation))
    }

    /// Local-to-world transform of an orthonormal frame placed at `origin`.
    pub fn from_frame(x_axis: Vec3, y_axis: Vec3, z_axis: Vec3, origin: Vec3) -> Self {
        Self::new(Mat4::from_cols(
            x_axis.extend(0.0),
            y_axis.extend(0.0),
            z_axis.extend(0.0),
            origin.extend(1.0),
        ))
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.mat
    }

    pub fn inverse_matrix(&self) -> &Mat4 {
        &self.inv
    }

    /// The inverse transform; just swaps the stored matrices.
    pub fn inverse(&self) -> Transform {
        Transform {
            mat: self.inv,
            inv: self.mat,
        }
    }

    #[inline]
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.mat.transform_point3(p)
    }

    #[inline]
    pub fn apply_point_inverse(&self, p: Vec3) -> Vec3 {
        self.inv.transform_point3(p)
    }

    /// Transform a direction (w = 0, translation ignored).
    #[inline]
    pub fn apply_direction(&self, v: Vec3) -> Vec3 {
        self.mat.transform_vector3(v)
    }

    #[inline]
    pub fn apply_direction_inverse(&self, v: Vec3) -> Vec3 {
        self.inv.transform_vector3(v)
    }

    /// Transform a surface normal with the inverse transpose. Not renormalized.
    #[inline]
    pub fn apply_normal(&self, n: Vec3) -> Vec3 {
        Mat3::from_mat4(self.inv).transpose() * n
    }

    #[inline]
    pub fn apply_normal_inverse(&self, n: Vec3) -> Vec3 {
        Mat3::from_mat4(self.mat).transpose() * n
    }

    /// Ratio of world to local area for a surface element with local normal `n`.
    ///
    /// Uses `dA_world = |det M| * |M^-T n| dA_local` for unit `n`.
    pub fn area_scale(&self, n: Vec3) -> f32 {
        let det = Mat3::from_mat4(self.mat).determinant().abs();
        det * self.apply_normal(n.normalize()).length()
    }

    /// World-space bounds of a local-space box (all eight corners transformed).
    pub fn apply_aabb(&self, aabb: &Aabb) -> Aabb {
        Aabb::from_iter_points(aabb.corners().into_iter().map(|c| self.apply_point(c)))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// `a * b` applies `b` first, then `a`.
    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            mat: self.mat * rhs.mat,
            inv: rhs.inv * self.inv,
        }
    }
}
