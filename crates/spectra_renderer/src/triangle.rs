//! Indexed triangle meshes.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! Each [`Triangle`] is a lightweight handle into a shared [`TriangleMesh`].

use crate::shape::{Shape, ShapeHit, SurfaceSample};
use crate::{Ray, Sampler};
use spectra_math::sampling::uniform_sample_triangle;
use spectra_math::{Aabb, Vec2, Vec3};
use std::sync::Arc;

/// Vertex data shared by all triangles of a mesh.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    /// Optional per-vertex shading normals
    pub normals: Option<Vec<Vec3>>,
    /// Optional per-vertex texture coordinates
    pub uvs: Option<Vec<Vec2>>,
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<[u32; 3]>) -> Self {
        let mesh = Self {
            positions,
            normals: None,
            uvs: None,
            indices,
        };
        mesh.check_indices();
        mesh
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        assert_eq!(normals.len(), self.positions.len(), "one normal per vertex");
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        assert_eq!(uvs.len(), self.positions.len(), "one uv per vertex");
        self.uvs = Some(uvs);
        self
    }

    fn check_indices(&self) {
        let count = self.positions.len() as u32;
        assert!(
            self.indices.iter().flatten().all(|&i| i < count),
            "triangle index out of range"
        );
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// One shape per face, all sharing this mesh.
    pub fn triangles(self: &Arc<Self>) -> Vec<Triangle> {
        (0..self.indices.len())
            .map(|index| Triangle::new(Arc::clone(self), index))
            .collect()
    }
}

/// A single face of a [`TriangleMesh`].
#[derive(Debug, Clone)]
pub struct Triangle {
    mesh: Arc<TriangleMesh>,
    index: usize,
}

impl Triangle {
    pub fn new(mesh: Arc<TriangleMesh>, index: usize) -> Self {
        assert!(index < mesh.indices.len(), "triangle index out of range");
        Self { mesh, index }
    }

    #[inline]
    fn vertex_indices(&self) -> [usize; 3] {
        let [a, b, c] = self.mesh.indices[self.index];
        [a as usize, b as usize, c as usize]
    }

    #[inline]
    fn vertices(&self) -> [Vec3; 3] {
        let [a, b, c] = self.vertex_indices();
        let p = &self.mesh.positions;
        [p[a], p[b], p[c]]
    }

    /// Interpolated shading normal, or the geometric normal without vertex normals.
    fn normal_at(&self, b1: f32, b2: f32, geometric: Vec3) -> Vec3 {
        match &self.mesh.normals {
            Some(normals) => {
                let [a, b, c] = self.vertex_indices();
                let n = (1.0 - b1 - b2) * normals[a] + b1 * normals[b] + b2 * normals[c];
                n.try_normalize().unwrap_or(geometric)
            }
            None => geometric,
        }
    }

    fn uv_at(&self, b1: f32, b2: f32) -> Vec2 {
        match &self.mesh.uvs {
            Some(uvs) => {
                let [a, b, c] = self.vertex_indices();
                (1.0 - b1 - b2) * uvs[a] + b1 * uvs[b] + b2 * uvs[c]
            }
            None => Vec2::new(b1, b2),
        }
    }

    /// Surface derivative along u, from the UV parameterization when available.
    fn dpdu(&self, edge1: Vec3, edge2: Vec3) -> Vec3 {
        if let Some(uvs) = &self.mesh.uvs {
            let [a, b, c] = self.vertex_indices();
            let duv1 = uvs[b] - uvs[a];
            let duv2 = uvs[c] - uvs[a];
            let det = duv1.x * duv2.y - duv1.y * duv2.x;
            if det.abs() > 1e-9 {
                return (duv2.y * edge1 - duv1.y * edge2) / det;
            }
        }
        edge1
    }
}

impl Shape for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn intersect(&self, ray: &Ray) -> Option<ShapeHit> {
        let [v0, v1, v2] = self.vertices();
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray.interval().surrounds(t) {
            return None;
        }

        let geometric = edge1.cross(edge2).normalize();
        Some(ShapeHit {
            t,
            position: ray.at(t),
            normal: self.normal_at(u, v, geometric),
            uv: self.uv_at(u, v),
            dpdu: self.dpdu(edge1, edge2),
        })
    }

    fn area(&self) -> f32 {
        let [v0, v1, v2] = self.vertices();
        0.5 * (v1 - v0).cross(v2 - v0).length()
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_iter_points(self.vertices())
    }

    fn sample_point(&self, sampler: &mut dyn Sampler) -> SurfaceSample {
        let [v0, v1, v2] = self.vertices();
        let b = uniform_sample_triangle(sampler.next_2d());
        // b.x weights v0, b.y weights v1
        let (b1, b2) = (b.y, 1.0 - b.x - b.y);
        let geometric = (v1 - v0).cross(v2 - v0).normalize();
        SurfaceSample {
            position: b.x * v0 + b.y * v1 + b2 * v2,
            normal: self.normal_at(b1, b2, geometric),
            pdf: 1.0 / self.area(),
        }
    }
}
