//! ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use log::debug;
use nalgebra::{Matrix3, Matrix4, Vector3};
use orbview_core::{project_to_screen, Mesh, ScreenPoint};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// A single directional light plus a constant ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Direction the light travels, normalized.
    pub direction: Vector3<f32>,
    pub ambient: f32,
}

impl Lighting {
    pub fn new(direction: Vector3<f32>, ambient: f32) -> Self {
        Self {
            direction: direction.try_normalize(f32::EPSILON).unwrap_or(-Vector3::z()),
            ambient: ambient.clamp(0.0, 1.0),
        }
    }

    /// Brightness in [0, 1] of a surface with unit normal `normal`.
    pub fn brightness(&self, normal: &Vector3<f32>) -> f32 {
        let diffuse = normal.dot(&-self.direction).max(0.0);
        (self.ambient + (1.0 - self.ambient) * diffuse).clamp(0.0, 1.0)
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new(Vector3::new(1.6, -1.8, -1.8), 0.2)
    }
}

/// Per-frame transforms handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub mvp: Matrix4<f32>,
    pub normal_matrix: Matrix3<f32>,
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    projected: Vec<Option<ScreenPoint>>,
    lighting: Lighting,
    diagnostics: bool,
    frames: u64,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            projected: Vec::new(),
            lighting: Lighting::default(),
            diagnostics: false,
            frames: 0,
        }
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    /// Log the first frame's setup at debug level.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let size = width * height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at column `x`, row `y`.
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, frame: &FrameContext) {
        let trace = self.diagnostics && self.frames == 0;
        self.frames += 1;

        // Project every vertex once; indexed triangles share the results
        let (width, height) = (self.width as u32, self.height as u32);
        self.projected.clear();
        self.projected.extend(
            mesh.vertices
                .iter()
                .map(|v| project_to_screen(&frame.mvp, &v.position, width, height)),
        );

        if trace {
            let visible = self.projected.iter().filter(|p| p.is_some()).count();
            debug!("render: {}x{} cells, mvp = {:?}", self.width, self.height, frame.mvp);
            debug!(
                "render: {} of {} vertices in front of the camera, {} triangles",
                visible,
                mesh.vertex_count(),
                mesh.triangle_count()
            );
        }

        let mut drawn = 0usize;
        for tri in mesh.indices.chunks_exact(3) {
            let corners = [
                self.projected[tri[0] as usize],
                self.projected[tri[1] as usize],
                self.projected[tri[2] as usize],
            ];
            // Triangle is clipped
            let [Some(a), Some(b), Some(c)] = corners else {
                continue;
            };

            // Shade with the averaged vertex normals in world space
            let normal = tri
                .iter()
                .map(|&i| frame.normal_matrix * mesh.vertices[i as usize].normal)
                .sum::<Vector3<f32>>()
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::z);
            let brightness = self.lighting.brightness(&normal);

            // Map brightness to character
            let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
            let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
            let character = LUMINOSITY_RAMP[char_index];

            self.rasterize_triangle([a, b, c], character);
            drawn += 1;
        }

        if trace {
            debug!("render: rasterized {drawn} triangles");
        }
    }

    fn rasterize_triangle(&mut self, coords: [ScreenPoint; 3], character: char) {
        let [v0, v1, v2] = coords;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.x, v0.y),
                    (v1.x, v1.y),
                    (v2.x, v2.y),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use orbview_core::{OrbitalCamera, Projection, Transform};

    fn frame(width: u32, height: u32) -> FrameContext {
        let camera = OrbitalCamera::new(
            Point3::new(0.0, 0.0, 3.0),
            Point3::origin(),
            Vector3::y(),
        );
        let projection = Projection::new(width, height);
        let model = Matrix4::identity();
        FrameContext {
            mvp: Transform::mvp_matrix(&model, &camera.view_matrix(), &projection.matrix(camera.fov())),
            normal_matrix: Transform::normal_matrix(&model),
        }
    }

    #[test]
    fn test_barycentric_inside() {
        let w = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!(w.0 > 0.0 && w.1 > 0.0 && w.2 > 0.0);
        assert!((w.0 + w.1 + w.2 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_cube_covers_center() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_mesh(&Mesh::cube(1.0), &frame(40, 20));
        let center = renderer.char_at(20, 10).unwrap();
        assert_ne!(center, ' ');
        assert_eq!(renderer.char_at(0, 0), Some(' '));
    }

    #[test]
    fn test_front_face_is_brighter_than_ambient() {
        // the light reaches the +Z face obliquely, so it must beat ambient
        let lighting = Lighting::default();
        let front = lighting.brightness(&Vector3::z());
        let back = lighting.brightness(&-Vector3::z());
        assert!(front > back);
        assert!((back - lighting.ambient).abs() < 1e-6);
    }

    #[test]
    fn test_clear_and_resize() {
        let mut renderer = AsciiRenderer::new(10, 5);
        renderer.render_mesh(&Mesh::cube(1.0), &frame(10, 5));
        renderer.clear();
        assert!((0..5).all(|y| (0..10).all(|x| renderer.char_at(x, y) == Some(' '))));
        renderer.resize(4, 3);
        assert_eq!(renderer.size(), (4, 3));
        assert_eq!(renderer.char_at(4, 0), None);
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let renderer = AsciiRenderer::new(3, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\r\n"));
    }
}
