use std::{
    cell::{Cell, RefCell},
    sync::atomic::{AtomicU64, Ordering},
};

/// Identity of a renderer's output surface once attached to a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocates a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Mount point a session renders into.
///
/// A container reports its current pixel size and hosts the renderer's
/// output surface. Methods take `&self`: containers are shared views owned
/// by the caller.
pub trait Container {
    /// Current drawable size in physical pixels
    fn client_size(&self) -> (u32, u32);

    /// Drops whatever the container currently hosts
    fn clear(&self);

    /// Hosts a renderer surface as a child of the container
    fn append_surface(&self, surface: SurfaceId);

    /// Surfaces currently hosted, oldest first
    fn surfaces(&self) -> Vec<SurfaceId>;
}

/// In-memory container for offscreen rendering and tests.
///
/// The size is whatever the owner last set; nothing is displayed.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    size: Cell<(u32, u32)>,
    surfaces: RefCell<Vec<SurfaceId>>,
}

impl MemoryContainer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
            surfaces: RefCell::new(Vec::new()),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }
}

impl Container for MemoryContainer {
    fn client_size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn clear(&self) {
        self.surfaces.borrow_mut().clear();
    }

    fn append_surface(&self, surface: SurfaceId) {
        self.surfaces.borrow_mut().push(surface);
    }

    fn surfaces(&self) -> Vec<SurfaceId> {
        self.surfaces.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_ids_are_unique() {
        let a = SurfaceId::next();
        let b = SurfaceId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_memory_container() {
        let container = MemoryContainer::new(640, 480);
        assert_eq!(container.client_size(), (640, 480));

        container.set_size(1024, 768);
        assert_eq!(container.client_size(), (1024, 768));

        let surface = SurfaceId::next();
        container.append_surface(surface);
        assert_eq!(container.surfaces(), vec![surface]);

        container.clear();
        assert!(container.surfaces().is_empty());
    }
}
