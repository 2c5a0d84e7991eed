//! # Host Environment
//!
//! The pieces of the surrounding environment a session depends on:
//!
//! - [`Container`] - the mount point: current pixel size and a place for the
//!   renderer's surface
//! - [`ResizeNotifier`] - window-level resize notifications
//! - [`TaskQueue`] - "run after the current synchronous work" scheduling
//!
//! Everything here is single-threaded. The event loop owner is expected to
//! call [`ResizeNotifier::notify`] on window resizes and
//! [`TaskQueue::run_pending`] once per loop turn; [`QuickSceneApp`](crate::app::QuickSceneApp)
//! does both for winit.

pub mod container;
pub mod resize;
pub mod task_queue;
pub mod window;

use std::rc::Rc;

pub use container::{Container, MemoryContainer, SurfaceId};
pub use resize::{ListenerId, ResizeNotifier};
pub use task_queue::{TaskId, TaskQueue};
pub use window::WindowContainer;

/// Resize notification source and task queue shared by the sessions of one event loop
#[derive(Clone, Default)]
pub struct Host {
    resize: Rc<ResizeNotifier>,
    tasks: Rc<TaskQueue>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize_notifier(&self) -> &Rc<ResizeNotifier> {
        &self.resize
    }

    pub fn task_queue(&self) -> &Rc<TaskQueue> {
        &self.tasks
    }

    /// Convenience for `resize_notifier().notify()`
    pub fn notify_resize(&self) {
        self.resize.notify();
    }

    /// Convenience for `task_queue().run_pending()`
    pub fn run_pending(&self) -> usize {
        self.tasks.run_pending()
    }
}
