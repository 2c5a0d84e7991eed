use crate::error::Result;
use crate::gfx::camera::PerspectiveCamera;
use crate::gfx::scene::Scene;
use crate::host::{MemoryContainer, SurfaceId};

use super::renderer::{Renderer, RendererDescriptor};

/// Renderer without a GPU.
///
/// Tracks size, frame and resize counts and what the last frame saw, which
/// is enough for offscreen picking and for exercising sessions in tests.
#[derive(Debug)]
pub struct HeadlessRenderer {
    surface: SurfaceId,
    antialias: bool,
    size: (u32, u32),
    frames_rendered: usize,
    resize_count: usize,
    last_frame: Option<FrameInfo>,
    disposed: bool,
}

/// What the last rendered frame contained
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub visible_meshes: usize,
    pub camera_aspect: f32,
}

impl HeadlessRenderer {
    pub fn antialias(&self) -> bool {
        self.antialias
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    /// Number of `set_size` calls since creation
    pub fn resize_count(&self) -> usize {
        self.resize_count
    }

    pub fn last_frame(&self) -> Option<FrameInfo> {
        self.last_frame
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Renderer for HeadlessRenderer {
    type Target = MemoryContainer;

    fn create(_target: &MemoryContainer, descriptor: &RendererDescriptor) -> Result<Self> {
        Ok(Self {
            surface: SurfaceId::next(),
            antialias: descriptor.antialias,
            size: (descriptor.width, descriptor.height),
            frames_rendered: 0,
            resize_count: 0,
            last_frame: None,
            disposed: false,
        })
    }

    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.resize_count += 1;
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        self.frames_rendered += 1;
        self.last_frame = Some(FrameInfo {
            visible_meshes: scene.visible_meshes().count(),
            camera_aspect: camera.aspect,
        });
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
