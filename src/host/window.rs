use std::{cell::RefCell, sync::Arc};

use winit::window::Window;

use super::container::{Container, SurfaceId};

/// A winit window used as a session's mount point.
///
/// The window hosts at most one surface at a time; clearing forgets the
/// previous one so a new renderer can take over the window.
pub struct WindowContainer {
    window: Arc<Window>,
    surfaces: RefCell<Vec<SurfaceId>>,
}

impl WindowContainer {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            surfaces: RefCell::new(Vec::new()),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl Container for WindowContainer {
    fn client_size(&self) -> (u32, u32) {
        self.window.inner_size().into()
    }

    fn clear(&self) {
        self.surfaces.borrow_mut().clear();
    }

    fn append_surface(&self, surface: SurfaceId) {
        let mut surfaces = self.surfaces.borrow_mut();
        if !surfaces.is_empty() {
            log::warn!("Window already hosts a surface, replacing it");
            surfaces.clear();
        }
        surfaces.push(surface);
    }

    fn surfaces(&self) -> Vec<SurfaceId> {
        self.surfaces.borrow().clone()
    }
}
