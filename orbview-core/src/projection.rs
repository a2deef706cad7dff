//! Perspective projection and screen-space mapping
use nalgebra::{Matrix4, Point3};

/// Perspective parameters that stay fixed while the camera moves.
///
/// The field of view is owned by the camera and passed in per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// A projected vertex: pixel coordinates plus normalized depth in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            near: 0.1,
            far: 10.0,
        }
    }

    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Create the projection matrix for a vertical field of view in radians
    pub fn matrix(&self, fov: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, fov, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Project a point through `mvp` onto a `width` x `height` pixel grid.
///
/// Returns `None` for points behind the eye or outside the near/far range.
/// Points beyond the left/right/top/bottom edges are kept so triangles that
/// straddle the border can still be clipped per pixel.
pub fn project_to_screen(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<ScreenPoint> {
    let clip = mvp * point.to_homogeneous();

    // Prevent division by near-zero depth values
    if clip.w <= 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    if !(-1.0..=1.0).contains(&depth) {
        return None;
    }

    // Convert to screen space
    Some(ScreenPoint {
        x: (ndc_x + 1.0) * 0.5 * width as f32,
        y: (1.0 - ndc_y) * 0.5 * height as f32,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn mvp() -> Matrix4<f32> {
        let projection = Projection::new(800, 600);
        let view = Matrix4::look_at_rh(
            &Point3::new(0.0, 0.0, 3.0),
            &Point3::origin(),
            &Vector3::y(),
        );
        projection.matrix(45f32.to_radians()) * view
    }

    #[test]
    fn test_projection_creation() {
        let projection = Projection::new(800, 600);
        assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(projection.near, 0.1);
        assert_eq!(projection.far, 10.0);
    }

    #[test]
    fn test_zero_sized_viewport() {
        let mut projection = Projection::default();
        projection.set_viewport(0, 0);
        assert!(projection.aspect.is_finite());
    }

    #[test]
    fn test_focus_projects_to_center() {
        let p = project_to_screen(&mvp(), &Point3::origin(), 800, 600).unwrap();
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
        assert!(p.depth > -1.0 && p.depth < 1.0);
    }

    #[test]
    fn test_screen_y_points_down() {
        let p = project_to_screen(&mvp(), &Point3::new(0.0, 0.5, 0.0), 800, 600).unwrap();
        assert!(p.y < 300.0);
    }

    #[test]
    fn test_behind_camera_is_rejected() {
        assert!(project_to_screen(&mvp(), &Point3::new(0.0, 0.0, 5.0), 800, 600).is_none());
        // beyond the far plane
        assert!(project_to_screen(&mvp(), &Point3::new(0.0, 0.0, -20.0), 800, 600).is_none());
    }
}
