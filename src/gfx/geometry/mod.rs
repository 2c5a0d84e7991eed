//! # Procedural Geometry Generation
//!
//! Common primitive shapes for populating a scene without model files.
//!
//! ```rust
//! use quickscene::gfx::geometry::{generate_box, generate_sphere, generate_plane};
//!
//! let crate_box = generate_box(20.0, 20.0, 20.0);
//! let ball = generate_sphere(10.0, 32, 16);
//! let floor = generate_plane(200.0, 200.0, 4, 4);
//! assert_eq!(crate_box.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Generated geometry data, ready to become a scene [`Mesh`](crate::gfx::scene::Mesh)
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v) in `[0, 1]`, one per vertex.
    ///
    /// Scene meshes draw flat-shaded and carry no UVs, so these are dropped
    /// by the conversion to [`Mesh`](crate::gfx::scene::Mesh). They are kept
    /// for callers that export or texture the geometry themselves.
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves positions and normals into the scene's vertex format
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
