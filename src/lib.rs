//! quickscene
//!
//! One call sets up a 3D scene session on a mount point: a renderer, a
//! perspective camera looking at the origin and, on request, orbit controls,
//! debounced resize handling and mouse ray picking.
//!
//! ```no_run
//! use std::rc::Rc;
//! use quickscene::prelude::*;
//!
//! let host = Host::new();
//! let container = Rc::new(MemoryContainer::new(800, 600));
//! let options = SceneOptions::default().with_resize().with_raycast();
//!
//! let mut session = quick_scene::<HeadlessRenderer>(&host, container, &options).unwrap();
//! let cube = session.scene_mut().unwrap().add_geometry("cube", &generate_box(20.0, 20.0, 20.0));
//! let hits = session.ray_pick(400.0, 300.0, &[cube]).unwrap();
//! session.destroy();
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod host;
pub mod prelude;
pub mod session;

use std::rc::Rc;

// Re-export main types for convenience
pub use app::QuickSceneApp;
pub use config::SceneOptions;
pub use error::{Result, SessionError};
pub use session::SceneSession;

use gfx::rendering::Renderer;
use host::Host;

/// Creates a scene session on `container`; see [`SceneSession::create`]
pub fn quick_scene<R: Renderer>(
    host: &Host,
    container: Rc<R::Target>,
    options: &SceneOptions,
) -> Result<SceneSession<R>> {
    SceneSession::create(host, container, options)
}
