//! Orbital camera: a position that circles a focus point.
//!
//! The camera never stores an orientation of its own. After every move the
//! position is rebuilt from the focus plus a rotated camera-to-focus vector,
//! so the camera always looks at its focus.
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};

/// Degrees of rotation per unit of orbit input.
pub const ORBIT_SENSITIVITY: f32 = 0.2;
/// Distance moved per unit of dolly input.
pub const DOLLY_SENSITIVITY: f32 = 0.1;
/// Distance moved per unit of track or pedestal input.
pub const PAN_SENSITIVITY: f32 = 0.001;

/// Closest the camera may get to either pole of the up axis, in degrees.
pub const POLE_EPSILON: f32 = 0.1;
/// Closest the camera may get to its focus.
pub const DOLLY_EPSILON: f32 = 0.005;

pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;

const AXIS_EPSILON: f32 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalCamera {
    position: Point3<f32>,
    focus: Point3<f32>,
    up: Vector3<f32>,
    /// Vertical field of view in degrees.
    fov: f32,
    /// Pending rotation about `up`, in degrees.
    yaw: f32,
    /// Pending rotation about `right`, in degrees.
    pitch: f32,
    right: Vector3<f32>,
}

impl OrbitalCamera {
    pub fn new(position: Point3<f32>, focus: Point3<f32>, up: Vector3<f32>) -> Self {
        let mut camera = Self {
            position,
            focus,
            up,
            fov: MAX_FOV,
            yaw: 0.0,
            pitch: 0.0,
            right: Vector3::x(),
        };
        camera.update_vectors();
        camera
    }

    /// Look-at view matrix for the current placement.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.focus, &self.up)
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn focus(&self) -> Point3<f32> {
        self.focus
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    /// Field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov.to_radians()
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov
    }

    /// Distance between the camera and its focus.
    pub fn distance(&self) -> f32 {
        (self.focus - self.position).norm()
    }

    /// Angle in degrees between the focus-to-camera direction and `up`.
    pub fn elevation_degrees(&self) -> f32 {
        (self.position - self.focus).angle(&self.up).to_degrees()
    }

    /// Rotate around the focus. `xoffset` turns about the up axis and
    /// `yoffset` tilts toward or away from it.
    ///
    /// The tilt is dropped when it would bring the camera within
    /// [`POLE_EPSILON`] of either pole. Each call is a one-shot relative
    /// rotation; nothing carries over to the next call.
    pub fn orbit(&mut self, xoffset: f32, yoffset: f32) {
        let xoffset = finite_or_zero(xoffset) * ORBIT_SENSITIVITY;
        let mut yoffset = finite_or_zero(yoffset) * ORBIT_SENSITIVITY;

        let elevation = self.elevation_degrees();
        let target = elevation + yoffset;
        if !(POLE_EPSILON..=180.0 - POLE_EPSILON).contains(&target) {
            yoffset = 0.0;
        }

        self.yaw -= xoffset;
        self.pitch -= yoffset;

        self.update_vectors();
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    /// Move toward (positive) or away from (negative) the focus.
    ///
    /// A move that would leave less than [`DOLLY_EPSILON`] between camera
    /// and focus is suppressed.
    pub fn dolly(&mut self, offset: f32) {
        let mut offset = finite_or_zero(offset) * DOLLY_SENSITIVITY;

        let cfv = self.focus - self.position;
        let length = cfv.norm();
        if length - offset < DOLLY_EPSILON {
            offset = 0.0;
        }

        if let Some(dir) = cfv.try_normalize(AXIS_EPSILON) {
            self.position = self.focus - (cfv - dir * offset);
        }
        self.update_vectors();
    }

    /// Strafe camera and focus together along the right axis.
    pub fn track(&mut self, offset: f32) {
        let delta = self.right * (finite_or_zero(offset) * PAN_SENSITIVITY);
        self.position += delta;
        self.focus += delta;
        self.update_vectors();
    }

    /// Move camera and focus together against the up axis.
    pub fn pedestal(&mut self, offset: f32) {
        let delta = self.up * (finite_or_zero(offset) * PAN_SENSITIVITY);
        self.position -= delta;
        self.focus -= delta;
        self.update_vectors();
    }

    /// Narrow (positive) or widen (negative) the field of view, clamped to
    /// [`MIN_FOV`]..=[`MAX_FOV`] degrees. Placement is unaffected.
    pub fn zoom(&mut self, offset: f32) {
        self.fov = (self.fov - finite_or_zero(offset)).clamp(MIN_FOV, MAX_FOV);
    }

    /// Recompute `right`, then apply the pending yaw and pitch to the
    /// camera-to-focus vector and rebuild the position from the focus.
    fn update_vectors(&mut self) {
        let cfv = self.focus - self.position;
        // colinear with up: keep the last usable right axis
        if let Some(right) = (-cfv.cross(&self.up)).try_normalize(AXIS_EPSILON) {
            self.right = right;
        }

        let cfv = rotate(cfv, self.yaw, &self.up);
        let cfv = rotate(cfv, self.pitch, &self.right);

        self.position = self.focus - cfv;
    }
}

impl Default for OrbitalCamera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.3, 0.4, 3.0),
            Point3::origin(),
            Vector3::new(0.0, 1.0, 0.0),
        )
    }
}

/// Non-finite input counts as no input.
fn finite_or_zero(x: f32) -> f32 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Rotate `v` by `degrees` about `axis` (right-handed).
fn rotate(v: Vector3<f32>, degrees: f32, axis: &Vector3<f32>) -> Vector3<f32> {
    if degrees == 0.0 {
        return v;
    }
    match Unit::try_new(*axis, AXIS_EPSILON) {
        Some(axis) => Rotation3::from_axis_angle(&axis, degrees.to_radians()) * v,
        None => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitalCamera {
        OrbitalCamera::new(
            Point3::new(0.0, 0.0, 3.0),
            Point3::origin(),
            Vector3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_construction() {
        let cam = camera();
        assert!((cam.fov_degrees() - 45.0).abs() < 1e-6);
        assert!((cam.fov() - 45f32.to_radians()).abs() < 1e-6);
        assert_eq!(cam.position(), Point3::new(0.0, 0.0, 3.0));
        // right = normalize(-(cfv x up)) for cfv = -Z, up = +Y
        assert!((cam.right() - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut cam = camera();
        for _ in 0..10 {
            cam.zoom(10.0);
        }
        assert_eq!(cam.fov_degrees(), MIN_FOV);
        for _ in 0..10 {
            cam.zoom(-10.0);
        }
        assert_eq!(cam.fov_degrees(), MAX_FOV);
    }

    #[test]
    fn test_zoom_does_not_move_camera() {
        let mut cam = camera();
        cam.zoom(5.0);
        assert_eq!(cam.position(), Point3::new(0.0, 0.0, 3.0));
        assert!((cam.fov_degrees() - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_zero_is_noop() {
        let mut cam = OrbitalCamera::default();
        let (position, focus) = (cam.position(), cam.focus());
        cam.orbit(0.0, 0.0);
        assert!((cam.position() - position).norm() < 1e-6);
        assert_eq!(cam.focus(), focus);
    }

    #[test]
    fn test_orbit_yaw_keeps_distance_and_height() {
        let mut cam = camera();
        cam.orbit(450.0, 0.0); // 90 degrees
        assert!((cam.distance() - 3.0).abs() < 1e-4);
        assert!(cam.position().y.abs() < 1e-4);
        // yaw -= 90 rotates (0,0,-3) by -90 degrees about +Y
        assert!((cam.position() - Point3::new(-3.0, 0.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_orbit_pitch_changes_elevation() {
        let mut cam = camera();
        assert!((cam.elevation_degrees() - 90.0).abs() < 1e-4);
        cam.orbit(0.0, 50.0); // +10 degrees of elevation
        assert!((cam.elevation_degrees() - 100.0).abs() < 1e-3);
        cam.orbit(0.0, -100.0);
        assert!((cam.elevation_degrees() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_orbit_does_not_accumulate() {
        let mut cam = camera();
        cam.orbit(50.0, 0.0);
        let after_first = cam.position();
        cam.orbit(0.0, 0.0);
        assert!((cam.position() - after_first).norm() < 1e-5);
    }

    #[test]
    fn test_orbit_pole_guard() {
        // 0.06 degree steps walk right up to the guard band
        let mut cam = camera();
        let mut lowest = f32::MAX;
        for _ in 0..2000 {
            cam.orbit(0.0, -0.3);
            lowest = lowest.min(cam.elevation_degrees());
        }
        assert!(lowest < 0.5, "stopped early at {lowest}");
        assert!(lowest >= POLE_EPSILON - 0.01, "crossed the pole: {lowest}");

        let mut highest = f32::MIN;
        for _ in 0..4000 {
            cam.orbit(0.0, 0.3);
            highest = highest.max(cam.elevation_degrees());
        }
        assert!(highest > 179.5, "stopped early at {highest}");
        assert!(highest <= 180.0 - POLE_EPSILON + 0.01, "crossed the pole: {highest}");
        assert!((cam.distance() - 3.0).abs() < 1e-2);
        assert!(cam.position().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_dolly_moves_toward_focus() {
        let mut cam = camera();
        cam.dolly(10.0);
        assert!((cam.distance() - 2.0).abs() < 1e-5);
        cam.dolly(-10.0);
        assert!((cam.distance() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_dolly_never_crosses_focus() {
        let mut cam = camera();
        cam.dolly(1000.0);
        assert!((cam.distance() - 3.0).abs() < 1e-5);
        cam.dolly(29.9);
        assert!(cam.distance() >= DOLLY_EPSILON);
        cam.dolly(1.0);
        assert!(cam.distance() >= DOLLY_EPSILON);
        assert_eq!(cam.focus(), Point3::origin());
    }

    #[test]
    fn test_track_moves_along_right() {
        let mut cam = camera();
        let cfv = cam.focus() - cam.position();
        cam.track(1000.0);
        assert!((cam.focus() - Point3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
        assert!(((cam.focus() - cam.position()) - cfv).norm() < 1e-5);
    }

    #[test]
    fn test_pedestal_moves_against_up() {
        let mut cam = camera();
        cam.pedestal(1000.0);
        assert!((cam.focus() - Point3::new(0.0, -1.0, 0.0)).norm() < 1e-5);
        assert!((cam.position() - Point3::new(0.0, -1.0, 3.0)).norm() < 1e-5);
    }

    #[test]
    fn test_view_matrix_maps_focus_ahead() {
        let cam = camera();
        let view = cam.view_matrix();
        let focus = view.transform_point(&cam.focus());
        // right-handed view space looks down -Z
        assert!(focus.x.abs() < 1e-5 && focus.y.abs() < 1e-5);
        assert!((focus.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut cam = camera();
        cam.orbit(f32::NAN, f32::INFINITY);
        cam.dolly(f32::NAN);
        cam.track(f32::NEG_INFINITY);
        cam.zoom(f32::NAN);
        assert!((cam.position() - Point3::new(0.0, 0.0, 3.0)).norm() < 1e-6);
        assert_eq!(cam.fov_degrees(), MAX_FOV);
    }

    #[test]
    fn test_colinear_up_stays_finite() {
        let mut cam = OrbitalCamera::new(
            Point3::new(0.0, 3.0, 0.0),
            Point3::origin(),
            Vector3::new(0.0, 1.0, 0.0),
        );
        cam.orbit(10.0, 10.0);
        cam.track(10.0);
        assert!(cam.position().iter().all(|c| c.is_finite()));
        assert!(cam.right().iter().all(|c| c.is_finite()));
    }
}
