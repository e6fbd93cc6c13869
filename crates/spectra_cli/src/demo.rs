//! Built-in demo scene.

use spectra_math::{Quat, Vec3};
use spectra_renderer::{
    AreaLight, Diffuse, Glass, Material, Mirror, Plane, SceneBuilder, Spd, Sphere, Transform,
    TriangleMesh,
};
use std::f32::consts::PI;
use std::sync::Arc;

/// Default camera placement for the demo scene.
pub const LOOK_FROM: Vec3 = Vec3::new(0.0, 1.2, 3.0);
pub const LOOK_AT: Vec3 = Vec3::new(0.0, 0.6, -1.5);

/// A ground plane with diffuse, mirror and glass spheres, a small
/// pyramid and an overhead blackbody panel light.
pub fn build() -> SceneBuilder {
    let ground: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::constant(0.6)));
    let red: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::from_rgb(Vec3::new(0.7, 0.12, 0.1))));
    let teal: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::from_rgb(Vec3::new(0.1, 0.5, 0.45))));
    let mirror: Arc<dyn Material> = Arc::new(Mirror::new(Spd::constant(0.9)));
    let glass: Arc<dyn Material> = Arc::new(Glass::bk7());
    let black: Arc<dyn Material> = Arc::new(Diffuse::new(Spd::zero()));

    let mut builder = SceneBuilder::new();

    builder.add_shape(
        Arc::new(Plane::new()),
        ground,
        Transform::from_scale(Vec3::new(40.0, 1.0, 40.0)),
    );

    builder
        .add_shape(
            Arc::new(Sphere::new(0.6)),
            red,
            Transform::from_translation(Vec3::new(-1.4, 0.6, -1.8)),
        )
        .add_shape(
            Arc::new(Sphere::new(0.6)),
            mirror,
            Transform::from_translation(Vec3::new(1.4, 0.6, -1.8)),
        )
        .add_shape(
            Arc::new(Sphere::new(0.5)),
            glass,
            Transform::from_translation(Vec3::new(0.0, 0.5, -1.0)),
        );

    let pyramid = Arc::new(TriangleMesh::new(
        vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(-0.5, 0.0, 0.5),
            Vec3::new(0.0, 0.9, 0.0),
        ],
        vec![[0, 4, 1], [1, 4, 2], [2, 4, 3], [3, 4, 0]],
    ));
    let pyramid_transform = Transform::from_scale_rotation_translation(
        Vec3::ONE,
        Quat::from_rotation_y(PI / 5.0),
        Vec3::new(0.0, 0.0, -3.2),
    );
    for triangle in pyramid.triangles() {
        builder.add_shape(Arc::new(triangle), teal.clone(), pyramid_transform);
    }

    // Panel faces down
    let light = AreaLight::new(Spd::blackbody(5500.0)).with_scale(12.0);
    builder.add_emitter(
        Arc::new(Plane::new()),
        black,
        Arc::new(light),
        Transform::from_scale_rotation_translation(
            Vec3::new(1.5, 1.0, 1.5),
            Quat::from_rotation_x(PI),
            Vec3::new(0.0, 3.5, -1.5),
        ),
    );

    builder
}
