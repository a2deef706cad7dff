//! Vertex normal synthesis for meshes that ship without normals.
use nalgebra::Vector3;

use crate::geometry::{unit_or_fallback, Mesh};

/// Squared length below which a normal counts as missing.
pub const MISSING_NORMAL_EPSILON: f32 = 1e-8;

impl Mesh {
    /// True if any vertex normal has a squared length below `epsilon`.
    pub fn has_missing_normals(&self, epsilon: f32) -> bool {
        self.vertices
            .iter()
            .any(|v| v.normal.norm_squared() < epsilon)
    }

    /// Replace every vertex normal with the area-weighted average of the
    /// faces around it.
    ///
    /// Each triangle adds its unnormalized face normal to its three corners,
    /// so larger faces pull harder. Vertices with no usable contribution get
    /// [`FALLBACK_NORMAL`](crate::geometry::FALLBACK_NORMAL).
    pub fn generate_normals(&mut self) {
        let mut acc = vec![Vector3::<f32>::zeros(); self.vertices.len()];

        for (corners, face) in self.indices.chunks_exact(3).zip(self.triangles()) {
            let n = face.face_normal();
            for &i in corners {
                acc[i as usize] += n;
            }
        }

        for (vertex, n) in self.vertices.iter_mut().zip(acc) {
            vertex.normal = unit_or_fallback(n);
        }
    }

    /// Regenerate normals only if some vertex is missing one.
    ///
    /// Returns whether normals were regenerated.
    pub fn ensure_normals(&mut self) -> bool {
        if self.has_missing_normals(MISSING_NORMAL_EPSILON) {
            self.generate_normals();
            true
        } else {
            false
        }
    }
}
