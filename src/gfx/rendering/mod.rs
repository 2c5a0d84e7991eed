//! Rendering backends
//!
//! [`Renderer`] is the seam a session draws through. [`RenderEngine`] presents
//! into a winit window with wgpu; [`HeadlessRenderer`] keeps bookkeeping only
//! and backs offscreen sessions.

pub mod headless;
pub mod render_engine;
pub mod renderer;

// Re-export main types
pub use headless::{FrameInfo, HeadlessRenderer};
pub use render_engine::RenderEngine;
pub use renderer::{Renderer, RendererDescriptor};
