//! # quickscene Prelude
//!
//! Commonly used types in one import.
//!
//! ```rust
//! use quickscene::prelude::*;
//! ```

// Re-export core session types
pub use crate::app::QuickSceneApp;
pub use crate::config::SceneOptions;
pub use crate::error::{Result, SessionError};
pub use crate::quick_scene;
pub use crate::session::SceneSession;

// Re-export graphics and scene types
pub use crate::gfx::camera::{ControlsChange, OrbitControls, PerspectiveCamera};
pub use crate::gfx::geometry::{generate_box, generate_cube, generate_plane, generate_sphere, GeometryData};
pub use crate::gfx::picking::{Intersection, Side};
pub use crate::gfx::rendering::{HeadlessRenderer, RenderEngine, Renderer};
pub use crate::gfx::scene::{Mesh, Object3D, ObjectId, Scene};

// Re-export host seams
pub use crate::host::{Container, Host, MemoryContainer, WindowContainer};

// Re-export common external dependencies
pub use cgmath::{Deg, Point3, Vector3};
