//! orbview core library - mesh loading and camera logic
//!
//! This library provides the renderer-independent part of the viewer: the
//! OBJ loader with vertex deduplication and normal synthesis, the orbital
//! camera with its mouse controller, and projection/transform helpers.

pub mod camera;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod normals;
pub mod obj;
pub mod projection;
pub mod transform;

// Re-export commonly used types
pub use camera::OrbitalCamera;
pub use controller::{MouseButton, OrbitController};
pub use error::{Attribute, ObjError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use obj::{IndexPolicy, LoadOptions, ObjLoader};
pub use projection::{project_to_screen, Projection, ScreenPoint};
pub use transform::Transform;
