//! Interactive terminal viewer for OBJ models
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton as TermButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use log::{debug, info};
use nalgebra::{Matrix3, Matrix4};
use orbview_core::{Mesh, MouseButton, OrbitController, OrbitalCamera, Projection, Transform};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod config;
pub mod renderer;

pub use config::{ConfigError, ViewerConfig};
pub use renderer::{AsciiRenderer, FrameContext, Lighting};

/// Camera step for keyboard orbiting, in mouse pixels
const KEY_ORBIT_STEP: f32 = 25.0;

/// Everything the viewer needs besides the mesh.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub camera: OrbitalCamera,
    pub near: f32,
    pub far: f32,
    pub model: Matrix4<f32>,
    pub cell_size: (f64, f64),
    pub target_fps: u32,
    pub lighting: Lighting,
    pub diagnostics: bool,
}

impl From<&ViewerConfig> for AppSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            camera: config.camera.camera(),
            near: config.projection.near,
            far: config.projection.far,
            model: config.render.model_matrix(),
            cell_size: (config.input.cell_width, config.input.cell_height),
            target_fps: config.render.target_fps,
            lighting: config.render.lighting(),
            diagnostics: config.render.diagnostics,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

/// Raw mode, alternate screen and mouse capture, released on drop.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        // from here on Drop undoes whatever was set up
        let guard = Self;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    mesh: Mesh,
    controller: OrbitController,
    home: OrbitalCamera,
    projection: Projection,
    model: Matrix4<f32>,
    normal_matrix: Matrix3<f32>,
    renderer: AsciiRenderer,
    cell_size: (f64, f64),
    frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, settings: AppSettings) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(mesh, settings, width, height))
    }

    /// Build the viewer for a `columns` x `rows` terminal.
    pub fn with_size(mesh: Mesh, settings: AppSettings, columns: u16, rows: u16) -> Self {
        let cell_size = (
            settings.cell_size.0.max(f64::EPSILON),
            settings.cell_size.1.max(f64::EPSILON),
        );
        let mut projection =
            Projection::default().with_planes(settings.near, settings.far);
        projection.set_viewport(
            pixels(columns, cell_size.0),
            pixels(rows, cell_size.1),
        );

        Self {
            mesh,
            controller: OrbitController::new(settings.camera.clone()),
            home: settings.camera,
            projection,
            model: settings.model,
            normal_matrix: Transform::normal_matrix(&settings.model),
            renderer: AsciiRenderer::new(columns as usize, rows as usize)
                .with_lighting(settings.lighting)
                .with_diagnostics(settings.diagnostics),
            cell_size,
            frame_time: Duration::from_millis(1000 / u64::from(settings.target_fps.max(1))),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn camera(&self) -> &OrbitalCamera {
        self.controller.camera()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        // Log before the alternate screen takes over stderr
        info!("{}", self.summary());
        let _guard = TerminalGuard::enter()?;
        self.main_loop()
    }

    pub fn summary(&self) -> String {
        format!(
            "viewing {} vertices, {} triangles",
            self.mesh.vertex_count(),
            self.mesh.triangle_count()
        )
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            // Drain pending input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => self.resize(columns, rows),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        let camera = self.controller.camera_mut();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('r') => {
                *camera = self.home.clone();
                debug!("camera reset");
            }
            KeyCode::Char('w') | KeyCode::Up => camera.orbit(0.0, KEY_ORBIT_STEP),
            KeyCode::Char('s') | KeyCode::Down => camera.orbit(0.0, -KEY_ORBIT_STEP),
            KeyCode::Char('a') | KeyCode::Left => camera.orbit(-KEY_ORBIT_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => camera.orbit(KEY_ORBIT_STEP, 0.0),
            KeyCode::Char('+') | KeyCode::Char('=') => camera.zoom(1.0),
            KeyCode::Char('-') => camera.zoom(-1.0),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        // Scale cells to pseudo-pixels so sensitivities match a window
        let x = f64::from(column) * self.cell_size.0;
        let y = f64::from(row) * self.cell_size.1;

        match kind {
            MouseEventKind::Down(button) => {
                self.controller.button_pressed(match button {
                    TermButton::Left => MouseButton::Left,
                    TermButton::Right => MouseButton::Right,
                    TermButton::Middle => MouseButton::Middle,
                });
                self.controller.cursor_moved(x, y);
            }
            MouseEventKind::Up(_) => self.controller.button_released(),
            MouseEventKind::Drag(_) | MouseEventKind::Moved => self.controller.cursor_moved(x, y),
            MouseEventKind::ScrollUp => self.controller.scrolled(1.0),
            MouseEventKind::ScrollDown => self.controller.scrolled(-1.0),
            _ => {}
        }
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        debug!("terminal resized to {columns}x{rows}");
        self.renderer.resize(columns as usize, rows as usize);
        self.projection.set_viewport(
            pixels(columns, self.cell_size.0),
            pixels(rows, self.cell_size.1),
        );
    }

    /// Transforms for the current camera.
    pub fn frame(&self) -> FrameContext {
        let camera = self.controller.camera();
        FrameContext {
            mvp: Transform::mvp_matrix(
                &self.model,
                &camera.view_matrix(),
                &self.projection.matrix(camera.fov()),
            ),
            normal_matrix: self.normal_matrix,
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let frame = self.frame();

        self.renderer.clear();
        self.renderer.render_mesh(&self.mesh, &frame);

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "orbview | FPS: {:.1} | fov {:.0} | LMB orbit RMB pan MMB dolly wheel zoom R reset Q quit",
                self.fps,
                self.controller.camera().fov_degrees()
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

fn pixels(cells: u16, cell_size: f64) -> u32 {
    (f64::from(cells) * cell_size).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn app() -> TerminalApp {
        TerminalApp::with_size(Mesh::cube(1.0), AppSettings::default(), 80, 24)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_aspect_uses_cell_size() {
        let app = app();
        // 80 * 8 by 24 * 16 pseudo-pixels
        assert!((app.projection().aspect - 640.0 / 384.0).abs() < 1e-6);
    }

    #[test]
    fn test_left_drag_orbits() {
        let mut app = app();
        let start = app.camera().position();
        app.handle_event(mouse(MouseEventKind::Down(TermButton::Left), 10, 10));
        app.handle_event(mouse(MouseEventKind::Drag(TermButton::Left), 20, 10));
        assert_ne!(app.camera().position(), start);
        assert!((app.camera().distance() - AppSettings::default().camera.distance()).abs() < 1e-4);
    }

    #[test]
    fn test_hover_does_nothing() {
        let mut app = app();
        let before = app.camera().clone();
        app.handle_event(mouse(MouseEventKind::Moved, 10, 10));
        app.handle_event(mouse(MouseEventKind::Moved, 30, 2));
        assert_eq!(app.camera(), &before);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::ScrollUp, 0, 0));
        assert!((app.camera().fov_degrees() - 44.0).abs() < 1e-5);
        app.handle_event(mouse(MouseEventKind::ScrollDown, 0, 0));
        app.handle_event(mouse(MouseEventKind::ScrollDown, 0, 0));
        assert!((app.camera().fov_degrees() - 45.0).abs() < 1e-5);
    }

    #[test]
    fn test_reset_restores_home() {
        let mut app = app();
        app.handle_event(key(KeyCode::Left));
        app.handle_event(mouse(MouseEventKind::ScrollUp, 0, 0));
        assert_ne!(app.camera(), &AppSettings::default().camera);
        app.handle_event(key(KeyCode::Char('r')));
        assert_eq!(app.camera(), &AppSettings::default().camera);
    }

    #[test]
    fn test_summary_counts_mesh() {
        assert_eq!(app().summary(), "viewing 24 vertices, 12 triangles");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(app.is_running());
        app.handle_event(key(KeyCode::Esc));
        assert!(!app.is_running());
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut app = app();
        app.handle_event(Event::Resize(40, 40));
        assert!((app.projection().aspect - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_frame_applies_model_offset() {
        let app = app();
        let camera = app.camera();
        let expected = Transform::mvp_matrix(
            &Transform::translation_matrix(0.0, -0.4, 0.0),
            &camera.view_matrix(),
            &app.projection().matrix(camera.fov()),
        );
        assert!((app.frame().mvp - expected).norm() < 1e-6);
    }
}
