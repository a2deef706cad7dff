//! Mouse-driven navigation for an [`OrbitalCamera`].
//!
//! Windowing-agnostic: front ends translate their own events into
//! [`OrbitController`] calls.
use crate::camera::OrbitalCamera;

/// Which mouse button is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
}

/// Routes pointer drags and scrolling to camera operations.
///
/// - left drag orbits
/// - right drag tracks horizontally and pedestals vertically
/// - middle drag dollies
/// - scrolling zooms
#[derive(Debug, Clone)]
pub struct OrbitController {
    camera: OrbitalCamera,
    button: MouseButton,
    last_cursor: Option<(f64, f64)>,
}

impl OrbitController {
    pub fn new(camera: OrbitalCamera) -> Self {
        Self {
            camera,
            button: MouseButton::None,
            last_cursor: None,
        }
    }

    pub fn camera(&self) -> &OrbitalCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitalCamera {
        &mut self.camera
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    pub fn button_pressed(&mut self, button: MouseButton) {
        self.button = button;
        // the next move only records where the drag starts
        self.last_cursor = None;
    }

    pub fn button_released(&mut self) {
        self.button = MouseButton::None;
    }

    /// Feed an absolute cursor position.
    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) else {
            return;
        };

        let xoffset = (x - last_x) as f32;
        // screen y grows downward
        let yoffset = (last_y - y) as f32;

        match self.button {
            MouseButton::None => {}
            MouseButton::Left => self.camera.orbit(xoffset, yoffset),
            MouseButton::Right => {
                self.camera.track(xoffset);
                self.camera.pedestal(yoffset);
            }
            MouseButton::Middle => self.camera.dolly(yoffset),
        }
    }

    pub fn scrolled(&mut self, delta: f64) {
        self.camera.zoom(delta as f32);
    }
}
