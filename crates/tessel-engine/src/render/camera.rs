use glam::{Mat4, Quat, Vec3};

use crate::coords::Viewport;

/// Supplies a projection * view matrix on demand.
pub trait Camera {
    fn view_projection(&self) -> Mat4;
}

impl Camera for Mat4 {
    #[inline]
    fn view_projection(&self) -> Mat4 {
        *self
    }
}

impl<C: Camera + ?Sized> Camera for &C {
    #[inline]
    fn view_projection(&self) -> Mat4 {
        (**self).view_projection()
    }
}

// ── orthographic camera ───────────────────────────────────────────────────

/// 2D camera: orthographic projection plus a view from a position and a
/// rotation about Z (radians).
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    projection: Mat4,
    view: Mat4,
    view_projection: Mat4,
    position: Vec3,
    rotation: f32,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self::with_depth(left, right, bottom, top, -1.0, 1.0)
    }

    pub fn with_depth(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let projection = Mat4::orthographic_rh(left, right, bottom, top, near, far);
        Self {
            projection,
            view: Mat4::IDENTITY,
            view_projection: projection,
            position: Vec3::ZERO,
            rotation: 0.0,
        }
    }

    /// Camera covering `viewport` in pixels, origin bottom-left.
    pub fn for_viewport(viewport: Viewport) -> Self {
        let mut cam = Self::new(0.0, 1.0, 0.0, 1.0);
        cam.projection = viewport.pixel_projection();
        cam.recalculate();
        cam
    }

    pub fn set_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.projection = Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0);
        self.recalculate();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate();
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.recalculate();
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    fn recalculate(&mut self) {
        let camera_to_world =
            Mat4::from_rotation_translation(Quat::from_rotation_z(self.rotation), self.position);
        self.view = camera_to_world.inverse();
        self.view_projection = self.projection * self.view;
    }
}

impl Camera for OrthographicCamera {
    #[inline]
    fn view_projection(&self) -> Mat4 {
        self.view_projection
    }
}

// ── live camera state ─────────────────────────────────────────────────────

/// The single projection the engine binds at flush time.
///
/// `current` is a snapshot taken when a camera is set; nothing is versioned
/// per draw, so geometry appended before a change is drawn with the new value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    default: Mat4,
    current: Option<Mat4>,
}

impl CameraState {
    pub fn new(default: Mat4) -> Self {
        Self {
            default,
            current: None,
        }
    }

    /// Matrix a flush made now would upload.
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.current.unwrap_or(self.default)
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        self.current.is_some()
    }

    pub fn set(&mut self, camera: &dyn Camera) {
        self.current = Some(camera.view_projection());
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn set_default(&mut self, default: Mat4) {
        self.default = default;
    }
}
