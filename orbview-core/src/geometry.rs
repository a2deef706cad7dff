//! Geometry primitives for 3D rendering
use nalgebra::{Point3, Vector2, Vector3};

/// Normal assigned to vertices whose surrounding geometry is degenerate.
pub const FALLBACK_NORMAL: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);

/// Number of floats per vertex in [`Mesh::interleaved`].
pub const INTERLEAVED_STRIDE: usize = 8;

/// A 3D vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, tex_coord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// A vertex at `position` with zeroed normal and texture coordinate.
    pub fn at(position: Point3<f32>) -> Self {
        Self::new(position, Vector3::zeros(), Vector2::zeros())
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Unnormalized face normal; its length is twice the triangle's area.
    pub fn face_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        (v1 - v0).cross(&(v2 - v0))
    }

    /// Calculate the unit face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        unit_or_fallback(self.face_normal())
    }
}

/// Normalizes `v`, or returns [`FALLBACK_NORMAL`] when that is not possible.
pub(crate) fn unit_or_fallback(v: Vector3<f32>) -> Vector3<f32> {
    match v.try_normalize(f32::MIN_POSITIVE) {
        Some(n) if n.iter().all(|c| c.is_finite()) => n,
        _ => FALLBACK_NORMAL,
    }
}

/// An indexed triangle mesh.
///
/// `indices` is grouped in triples, one per triangle, each entry naming a
/// vertex in `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the mesh's triangles in index order.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            Triangle::new(
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            )
        })
    }

    /// Vertex data as `[px, py, pz, nx, ny, nz, u, v]` per vertex, ready for
    /// upload as a single vertex buffer.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.vertices.len() * INTERLEAVED_STRIDE);
        for v in &self.vertices {
            data.extend_from_slice(&[
                v.position.x,
                v.position.y,
                v.position.z,
                v.normal.x,
                v.normal.y,
                v.normal.z,
                v.tex_coord.x,
                v.tex_coord.y,
            ]);
        }
        data
    }

    /// Axis-aligned bounds of all vertex positions.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.inf(&v.position), max.sup(&v.position))
        }))
    }

    /// Create a simple cube mesh for testing
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        // (outward normal, u axis, v axis) with u x v == normal
        let faces = [
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
            (Vector3::y(), Vector3::z(), Vector3::x()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::x(), Vector3::y(), Vector3::z()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut mesh = Self::with_capacity(24, 36);
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (su, sv) in corners {
                let offset: Vector3<f32> = (normal + u * su + v * sv) * half;
                mesh.vertices.push(Vertex::new(
                    Point3::from(offset),
                    normal,
                    Vector2::new((su + 1.0) / 2.0, (sv + 1.0) / 2.0),
                ));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_layout() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertex_count()));
    }

    #[test]
    fn test_cube_winding_faces_outward() {
        let cube = Mesh::cube(2.0);
        for tri in cube.triangles() {
            let n = tri.calculate_normal();
            assert!((n - tri.vertices[0].normal).norm() < 1e-6);
        }
    }

    #[test]
    fn test_interleaved_layout() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector2::new(0.25, 0.75),
        ));
        assert_eq!(
            mesh.interleaved(),
            vec![1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.25, 0.75]
        );
    }

    #[test]
    fn test_degenerate_triangle_normal() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let tri = Triangle::new(Vertex::at(p), Vertex::at(p), Vertex::at(p));
        assert_eq!(tri.calculate_normal(), FALLBACK_NORMAL);
    }

    #[test]
    fn test_bounds() {
        assert!(Mesh::new().bounds().is_none());
        let (min, max) = Mesh::cube(2.0).bounds().unwrap();
        assert_eq!(min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 1.0));
    }
}
