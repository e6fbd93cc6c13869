use crate::Vec3;

/// Orthonormal shading frame. Local +Y is the surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub bitangent: Vec3,
}

impl Frame {
    /// Build a frame around `normal` with an arbitrary tangent.
    ///
    /// Branchless construction from Duff et al., "Building an Orthonormal Basis, Revisited".
    pub fn from_normal(normal: Vec3) -> Self {
        let n = normal.normalize();
        let sign = 1.0_f32.copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        let t = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let bt = Vec3::new(b, sign + n.y * n.y * a, -n.y);
        // t, n, bt must be right handed as (x, y, z)
        if t.cross(n).dot(bt) >= 0.0 {
            Self { tangent: t, normal: n, bitangent: bt }
        } else {
            Self { tangent: bt, normal: n, bitangent: t }
        }
    }

    /// Build a frame around `normal`, aligning the tangent with `dpdu` where possible.
    pub fn from_normal_tangent(normal: Vec3, dpdu: Vec3) -> Self {
        let n = normal.normalize();
        let t = dpdu - n * n.dot(dpdu);
        if t.length_squared() < 1e-12 {
            return Self::from_normal(n);
        }
        let t = t.normalize();
        Self {
            tangent: t,
            normal: n,
            bitangent: t.cross(n),
        }
    }

    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.tangent), v.dot(self.normal), v.dot(self.bitangent))
    }

    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.tangent * v.x + self.normal * v.y + self.bitangent * v.z
    }
}
