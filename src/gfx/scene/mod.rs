//! # Scene Management Module
//!
//! The scene graph a session renders and picks against.
//!
//! ## Key Components
//!
//! - [`Scene`] - Arena of objects with a root, parent/child links and world transforms
//! - [`Object3D`] - A node with a local transform and an optional [`Mesh`]
//! - [`Vertex3D`] - GPU vertex format with position and normal
//!
//! ## Usage
//!
//! ```no_run
//! use quickscene::gfx::geometry::generate_cube;
//! use quickscene::gfx::scene::Scene;
//!
//! let mut scene = Scene::new();
//! let cube = scene.add_geometry("cube", &generate_cube());
//! let model = scene.load_obj("teapot.obj").unwrap();
//! ```

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{Mesh, Object3D};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;

/// Handle to an object stored in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}
