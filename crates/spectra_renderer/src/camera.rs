//! Cameras for primary ray generation.
//!
//! Camera-local space: +X right, +Y up, looking down -Z. Film positions are
//! in physical film units with the origin at the film center and +Y up.
//!
//! A camera returns the ray together with `cos` and `pdf` terms; the
//! renderer weights each radiance sample by `cos / (lambda_pdf * pdf)`.

use crate::config::{CameraKind, CameraSettings};
use crate::{Ray, Sampler};
use spectra_math::sampling::concentric_sample_disk;
use spectra_math::{Mat3, Quat, Transform, Vec2, Vec3};
use std::f32::consts::PI;

/// A primary ray and its importance terms.
#[derive(Debug, Clone, Copy)]
pub struct CameraRay {
    pub ray: Ray,
    /// Cosine of the ray against the optical axis at the film
    pub cos: f32,
    /// Directional density relative to the on-axis ray
    pub pdf: f32,
}

/// Placement and film geometry shared by all camera models.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    /// Camera-local to world
    transform: Transform,
    width: u32,
    height: u32,
    film_width: f32,
    film_height: f32,
}

impl CameraFrame {
    pub fn new(width: u32, height: u32, film_width: f32, film_height: f32) -> Self {
        let mut frame = Self {
            transform: Transform::IDENTITY,
            width: 1,
            height: 1,
            film_width: 1.0,
            film_height: 1.0,
        };
        frame.set_film(width, height, film_width, film_height);
        frame
    }

    /// Update resolution and physical film size.
    pub fn set_film(&mut self, width: u32, height: u32, film_width: f32, film_height: f32) {
        assert!(width > 0 && height > 0, "film resolution must be non-zero");
        assert!(film_width > 0.0 && film_height > 0.0, "film size must be positive");
        self.width = width;
        self.height = height;
        self.film_width = film_width;
        self.film_height = film_height;
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn film_size(&self) -> Vec2 {
        Vec2::new(self.film_width, self.film_height)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.apply_point(Vec3::ZERO)
    }

    /// World-space viewing direction (local -Z).
    pub fn forward(&self) -> Vec3 {
        self.transform.apply_direction(-Vec3::Z)
    }

    pub fn right(&self) -> Vec3 {
        self.transform.apply_direction(Vec3::X)
    }

    pub fn up(&self) -> Vec3 {
        self.transform.apply_direction(Vec3::Y)
    }

    /// Place the camera at `look_from` looking at `look_at`.
    ///
    /// # Panics
    /// If the two points coincide or `up` is parallel to the view direction.
    pub fn set_look_at(&mut self, look_from: Vec3, look_at: Vec3, up: Vec3) {
        let forward = look_at - look_from;
        assert!(
            forward.length_squared() > 1e-12,
            "degenerate look-at: camera position equals target"
        );
        let w = -forward.normalize();
        let u = up.cross(w);
        assert!(
            u.length_squared() > 1e-12,
            "degenerate look-at: up vector is parallel to the view direction"
        );
        let u = u.normalize();
        let v = w.cross(u);
        self.transform = Transform::from_frame(u, v, w, look_from);
    }

    /// Translate along the camera's own axes (`x` right, `y` up, `z` backward).
    pub fn move_camera(&mut self, delta: Vec3) {
        let offset = self.transform.apply_direction(delta);
        let origin = self.position() + offset;
        self.transform = Transform::from_frame(self.right(), self.up(), -self.forward(), origin);
    }

    /// Yaw around world +Y, then pitch around the camera's right axis. Angles in radians.
    pub fn rotate_camera(&mut self, yaw: f32, pitch: f32) {
        let basis = Mat3::from_cols(self.right(), self.up(), -self.forward());
        let rotation = (Quat::from_rotation_y(yaw) * Quat::from_mat3(&basis) * Quat::from_rotation_x(pitch))
            .normalize();
        let m = Mat3::from_quat(rotation);
        self.transform = Transform::from_frame(m.x_axis, m.y_axis, m.z_axis, self.position());
    }

    /// Box-filtered film position inside pixel `(i, j)`; row 0 is the top of the image.
    ///
    /// # Panics
    /// If the pixel is outside the film.
    pub fn sample_film(&self, i: u32, j: u32, sampler: &mut dyn Sampler) -> Vec2 {
        assert!(
            i < self.width && j < self.height,
            "pixel ({i}, {j}) outside {}x{} film",
            self.width,
            self.height
        );
        let u = sampler.next_2d();
        let s = (i as f32 + u.x) / self.width as f32;
        let t = (j as f32 + u.y) / self.height as f32;
        Vec2::new((s - 0.5) * self.film_width, (0.5 - t) * self.film_height)
    }
}

/// Generates primary rays for film positions.
pub trait Camera: Send + Sync {
    fn frame(&self) -> &CameraFrame;

    fn frame_mut(&mut self) -> &mut CameraFrame;

    /// Sample a film position inside pixel `(i, j)`.
    fn sample_film(&self, i: u32, j: u32, sampler: &mut dyn Sampler) -> Vec2 {
        self.frame().sample_film(i, j, sampler)
    }

    /// World-space ray through `film_pos`, or `None` if no valid ray exists.
    fn generate_ray(&self, film_pos: Vec2, lambda: f32, sampler: &mut dyn Sampler) -> Option<CameraRay>;

    fn set_look_at(&mut self, look_from: Vec3, look_at: Vec3, up: Vec3) {
        self.frame_mut().set_look_at(look_from, look_at, up);
    }

    fn move_camera(&mut self, delta: Vec3) {
        self.frame_mut().move_camera(delta);
    }

    fn rotate_camera(&mut self, yaw: f32, pitch: f32) {
        self.frame_mut().rotate_camera(yaw, pitch);
    }
}

/// Distance from pinhole to film for a horizontal field of view.
fn image_distance(film_width: f32, fov_degrees: f32) -> f32 {
    film_width / (2.0 * (fov_degrees.to_radians() / 2.0).tan())
}

/// Ideal pinhole camera.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    frame: CameraFrame,
    /// Horizontal field of view in degrees
    fov: f32,
}

impl PinholeCamera {
    pub fn new(frame: CameraFrame, fov: f32) -> Self {
        assert!(fov > 0.0 && fov < 180.0, "field of view must be in (0, 180) degrees");
        Self { frame, fov }
    }

    pub fn image_distance(&self) -> f32 {
        image_distance(self.frame.film_width, self.fov)
    }
}

impl Camera for PinholeCamera {
    fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut CameraFrame {
        &mut self.frame
    }

    fn generate_ray(&self, film_pos: Vec2, lambda: f32, _sampler: &mut dyn Sampler) -> Option<CameraRay> {
        let local = Vec3::new(film_pos.x, film_pos.y, -self.image_distance()).normalize();
        let transform = self.frame.transform();
        let ray = Ray::new(
            transform.apply_point(Vec3::ZERO),
            transform.apply_direction(local).normalize(),
            lambda,
        );
        Some(CameraRay { ray, cos: 1.0, pdf: 1.0 })
    }
}

/// Thin lens camera with depth of field.
#[derive(Debug, Clone)]
pub struct ThinLensCamera {
    frame: CameraFrame,
    fov: f32,
    lens_radius: f32,
    focus_distance: f32,
}

impl ThinLensCamera {
    pub fn new(frame: CameraFrame, fov: f32, lens_radius: f32, focus_distance: f32) -> Self {
        assert!(fov > 0.0 && fov < 180.0, "field of view must be in (0, 180) degrees");
        assert!(lens_radius >= 0.0, "lens radius must be non-negative");
        assert!(focus_distance > 0.0, "focus distance must be positive");
        Self {
            frame,
            fov,
            lens_radius,
            focus_distance,
        }
    }

    pub fn image_distance(&self) -> f32 {
        image_distance(self.frame.film_width, self.fov)
    }
}

impl Camera for ThinLensCamera {
    fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut CameraFrame {
        &mut self.frame
    }

    fn generate_ray(&self, film_pos: Vec2, lambda: f32, sampler: &mut dyn Sampler) -> Option<CameraRay> {
        let d = self.image_distance();
        let chief = Vec3::new(film_pos.x, film_pos.y, -d);
        let cos_theta = d / chief.length();

        // Where the chief ray crosses the plane of focus
        let focus_point = chief * (self.focus_distance / d);
        let lens = self.lens_radius * concentric_sample_disk(sampler.next_2d());
        let origin = Vec3::new(lens.x, lens.y, 0.0);

        let direction = (focus_point - origin).normalize();
        // The focus plane lies in front of the lens, so this only rejects
        // non-finite film positions
        if !(direction.z < 0.0) {
            return None;
        }

        let transform = self.frame.transform();
        let ray = Ray::new(
            transform.apply_point(origin),
            transform.apply_direction(direction).normalize(),
            lambda,
        );
        Some(CameraRay {
            ray,
            cos: cos_theta,
            pdf: 1.0 / (cos_theta * cos_theta * cos_theta),
        })
    }
}

/// Full-sphere latitude/longitude camera.
///
/// The film width spans 360 degrees of longitude and the height spans 180
/// degrees of latitude. The image center looks down local -Z.
#[derive(Debug, Clone)]
pub struct EnvironmentCamera {
    frame: CameraFrame,
}

impl EnvironmentCamera {
    pub fn new(frame: CameraFrame) -> Self {
        Self { frame }
    }
}

impl Camera for EnvironmentCamera {
    fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut CameraFrame {
        &mut self.frame
    }

    fn generate_ray(&self, film_pos: Vec2, lambda: f32, _sampler: &mut dyn Sampler) -> Option<CameraRay> {
        let size = self.frame.film_size();
        let u = film_pos.x / size.x + 0.5;
        let v = 0.5 - film_pos.y / size.y;

        let phi = (u - 0.5) * 2.0 * PI;
        let theta = v * PI;
        let local = Vec3::new(theta.sin() * phi.sin(), theta.cos(), -theta.sin() * phi.cos());

        let transform = self.frame.transform();
        let ray = Ray::new(
            transform.apply_point(Vec3::ZERO),
            transform.apply_direction(local).normalize(),
            lambda,
        );
        Some(CameraRay { ray, cos: 1.0, pdf: 1.0 })
    }
}

/// Build the camera described by `settings` for a film of the given geometry.
pub fn create_camera(
    settings: &CameraSettings,
    width: u32,
    height: u32,
    film_width: f32,
    film_height: f32,
) -> Box<dyn Camera> {
    let mut frame = CameraFrame::new(width, height, film_width, film_height);
    frame.set_look_at(settings.look_from, settings.look_at, settings.up);

    match settings.kind {
        CameraKind::Pinhole => Box::new(PinholeCamera::new(frame, settings.fov)),
        CameraKind::ThinLens => Box::new(ThinLensCamera::new(
            frame,
            settings.fov,
            settings.lens_radius,
            settings.focus_distance,
        )),
        CameraKind::Environment => Box::new(EnvironmentCamera::new(frame)),
    }
}
