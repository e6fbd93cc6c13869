//! Bounding Volume Hierarchy (BVH) intersector.
//!
//! Binary tree over world-space primitive bounds, built by median split
//! along the longest centroid axis. Answers the same queries as
//! [`crate::LinearIntersector`].

use crate::intersector::Intersector;
use crate::{IntersectInfo, Primitive, Ray};
use spectra_math::Aabb;
use std::sync::Arc;

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitive indices.
enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf { indices: Vec<usize>, bbox: Aabb },
    /// Empty node (no primitives at all).
    Empty,
}

impl BvhNode {
    /// Recursive BVH construction.
    ///
    /// Simple median-split approach: sort primitives by centroid on the
    /// longest centroid axis, split in half, recurse.
    fn build(primitives: &[Arc<Primitive>], mut indices: Vec<usize>) -> Self {
        if indices.is_empty() {
            return BvhNode::Empty;
        }

        let bbox = indices.iter().fold(Aabb::EMPTY, |acc, &i| {
            Aabb::surrounding(&acc, &primitives[i].bounds())
        });

        if indices.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf { indices, bbox };
        }

        let centroid_bounds =
            Aabb::from_iter_points(indices.iter().map(|&i| primitives[i].bounds().centroid()));
        let axis = centroid_bounds.longest_axis();

        indices.sort_unstable_by(|&a, &b| {
            let a_val = primitives[a].bounds().centroid()[axis];
            let b_val = primitives[b].bounds().centroid()[axis];
            a_val.total_cmp(&b_val)
        });

        let mid = indices.len() / 2;
        let right_indices = indices.split_off(mid);

        BvhNode::Branch {
            left: Box::new(Self::build(primitives, indices)),
            right: Box::new(Self::build(primitives, right_indices)),
            bbox,
        }
    }

    fn intersect<'a>(
        &self,
        primitives: &'a [Arc<Primitive>],
        ray: &Ray,
        info: &mut IntersectInfo<'a>,
    ) -> bool {
        match self {
            BvhNode::Empty => false,

            BvhNode::Leaf { indices, bbox } => {
                if !bbox.hit(ray.origin(), ray.direction(), ray.interval()) {
                    return false;
                }

                let mut ray = *ray;
                let mut hit_anything = false;
                for &i in indices {
                    if primitives[i].intersect(&ray, info) {
                        hit_anything = true;
                        ray = ray.with_interval(ray.interval().with_max(info.t));
                    }
                }
                hit_anything
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray.origin(), ray.direction(), ray.interval()) {
                    return false;
                }

                let hit_left = left.intersect(primitives, ray, info);

                // Only check right up to closest hit
                let right_ray = if hit_left {
                    ray.with_interval(ray.interval().with_max(info.t))
                } else {
                    *ray
                };
                let hit_right = right.intersect(primitives, &right_ray, info);

                hit_left || hit_right
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Empty | BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Accelerated intersector over a median-split BVH.
pub struct BvhIntersector {
    primitives: Vec<Arc<Primitive>>,
    root: BvhNode,
}

impl BvhIntersector {
    pub fn new(primitives: Vec<Arc<Primitive>>) -> Self {
        let start = std::time::Instant::now();
        let root = BvhNode::build(&primitives, (0..primitives.len()).collect());
        log::info!(
            "Built BVH over {} primitives (depth {}) in {:.2?}",
            primitives.len(),
            root.depth(),
            start.elapsed()
        );
        Self { primitives, root }
    }

    /// Bounds of the whole scene.
    pub fn bounds(&self) -> Aabb {
        match &self.root {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}

impl Intersector for BvhIntersector {
    fn intersect<'a>(&'a self, ray: &Ray, info: &mut IntersectInfo<'a>) -> bool {
        self.root.intersect(&self.primitives, ray, info)
    }

    fn primitives(&self) -> &[Arc<Primitive>] {
        &self.primitives
    }
}
