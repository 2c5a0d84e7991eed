//! The renderer seam a [`SceneSession`](crate::session::SceneSession) draws through.

use crate::error::Result;
use crate::gfx::camera::PerspectiveCamera;
use crate::gfx::scene::Scene;
use crate::host::{Container, SurfaceId};

/// Parameters a renderer is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererDescriptor {
    pub antialias: bool,
    pub width: u32,
    pub height: u32,
}

/// Draws a scene through a camera into a surface hosted by a container.
pub trait Renderer: Sized + 'static {
    /// The kind of container this renderer can present into
    type Target: Container + 'static;

    /// Creates a renderer whose surface can be attached to `target`
    fn create(target: &Self::Target, descriptor: &RendererDescriptor) -> Result<Self>;

    /// Identity of the output surface, for attaching to the container
    fn surface(&self) -> SurfaceId;

    /// Resizes the output surface in physical pixels
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()>;

    /// Releases GPU resources. Rendering afterwards is a no-op.
    fn dispose(&mut self);
}
