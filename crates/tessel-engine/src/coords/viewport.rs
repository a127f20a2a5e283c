use glam::Mat4;

/// Viewport size in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }

    /// Orthographic projection mapping `[0, width] x [0, height]` to clip space.
    ///
    /// Origin bottom-left, +Y up. Degenerate sizes are treated as 1x1 so the
    /// matrix stays invertible.
    pub fn pixel_projection(self) -> Mat4 {
        let w = if self.width > 0.0 { self.width } else { 1.0 };
        let h = if self.height > 0.0 { self.height } else { 1.0 };
        Mat4::orthographic_rh(0.0, w, 0.0, h, -1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn pixel_projection_maps_corners_to_ndc() {
        let m = Viewport::new(800.0, 600.0).pixel_projection();
        let bl = m.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let tr = m.project_point3(Vec3::new(800.0, 600.0, 0.0));
        assert!((bl.x + 1.0).abs() < 1e-5 && (bl.y + 1.0).abs() < 1e-5);
        assert!((tr.x - 1.0).abs() < 1e-5 && (tr.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_viewport_still_projects() {
        let m = Viewport::new(0.0, 0.0).pixel_projection();
        assert!(m.is_finite());
        assert!(!Viewport::new(0.0, 10.0).is_valid());
    }
}
