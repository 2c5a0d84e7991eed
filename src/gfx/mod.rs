//! # Graphics Module
//!
//! Everything a scene session draws and picks with.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Perspective camera and orbit controls
//! - **Geometry** ([`geometry`]) - Procedural boxes, spheres and planes
//! - **Picking** ([`picking`]) - Pointer ray casting against scene meshes
//! - **Rendering** ([`rendering`]) - The renderer seam, a wgpu window renderer and a headless one
//! - **Scene Management** ([`scene`]) - Object hierarchy and scene graph
//!
//! ## Usage
//!
//! ```no_run
//! use quickscene::gfx::{geometry::generate_cube, scene::Scene};
//!
//! let mut scene = Scene::new();
//! scene.add_geometry("cube", &generate_cube());
//! ```

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod scene;

// Re-export commonly used types
pub use camera::{OrbitControls, PerspectiveCamera};
pub use rendering::{HeadlessRenderer, RenderEngine, Renderer};
pub use scene::Scene;
