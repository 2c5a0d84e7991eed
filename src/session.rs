//! # Scene Sessions
//!
//! A [`SceneSession`] is one rendering context bound to a container: the
//! scene root, a perspective camera looking at the origin, a renderer whose
//! surface is attached to the container, and whichever of orbit controls,
//! resize handling and ray picking the options enable.
//!
//! ## Resize handling
//!
//! With `resize.enable` the session listens on the host's
//! [`ResizeNotifier`]. A burst of notifications within one turn collapses into
//! a single recompute on the host's [`TaskQueue`]: each notification cancels
//! the pending recompute and schedules a new one. The recompute reads the
//! container size when it runs, not when it was scheduled.
//!
//! ## Teardown
//!
//! [`SceneSession::destroy`] unsubscribes from resizes, cancels a pending
//! recompute and disposes the controls and the renderer. It runs on drop as
//! well; calling it twice is a no-op. Every other operation on a destroyed
//! session fails with [`SessionError::InvalidSessionState`].

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use cgmath::{Point3, Vector2};

use crate::config::SceneOptions;
use crate::error::{Result, SessionError};
use crate::gfx::camera::camera_utils::clamp_viewport;
use crate::gfx::camera::{OrbitControls, PerspectiveCamera};
use crate::gfx::picking::{write_pixel_to_ndc, Intersection, Raycaster};
use crate::gfx::rendering::{Renderer, RendererDescriptor};
use crate::gfx::scene::{ObjectId, Scene};
use crate::host::{Container, Host, ListenerId, ResizeNotifier, TaskId, TaskQueue};

/// A bound rendering context. See the [module docs](self).
pub struct SceneSession<R: Renderer> {
    state: Option<SessionState<R>>,
}

struct SessionState<R: Renderer> {
    container: Rc<R::Target>,
    scene: Scene,
    camera: Rc<RefCell<PerspectiveCamera>>,
    renderer: Rc<RefCell<R>>,
    controls: Option<Rc<RefCell<OrbitControls>>>,
    resize: Option<ResizeSubscription>,
    picking: Option<Picking>,
}

struct ResizeSubscription {
    notifier: Rc<ResizeNotifier>,
    tasks: Rc<TaskQueue>,
    listener: ListenerId,
    pending: Rc<Cell<Option<TaskId>>>,
}

// Scratch state reused across picks
struct Picking {
    pointer: Vector2<f32>,
    raycaster: Raycaster,
}

impl<R: Renderer> SceneSession<R> {
    /// Builds a session on `container`, replacing whatever it hosted before.
    ///
    /// # Arguments
    /// * `host` - Resize notifications and the task queue the recompute runs on
    /// * `container` - Mount point; its size drives the camera aspect and renderer size
    /// * `options` - What to enable; see [`SceneOptions`]
    pub fn create(host: &Host, container: Rc<R::Target>, options: &SceneOptions) -> Result<Self> {
        container.clear();

        let scene = Scene::new();
        let (width, height) = {
            let (width, height) = container.client_size();
            clamp_viewport(width, height)
        };

        let camera = {
            let mut camera = PerspectiveCamera::with_aspect(width as f32 / height as f32);
            camera.set_position(options.camera.position);
            camera.look_at(Point3::new(0.0, 0.0, 0.0));
            camera.update_projection_matrix();
            Rc::new(RefCell::new(camera))
        };

        let mut renderer = R::create(
            &container,
            &RendererDescriptor {
                antialias: true,
                width,
                height,
            },
        )?;
        container.append_surface(renderer.surface());
        renderer.render(&scene, &camera.borrow())?;
        let renderer = Rc::new(RefCell::new(renderer));

        let controls = options.trackball_control.enable.then(|| {
            let trackball = &options.trackball_control;
            let mut controls = OrbitControls::new(camera.clone());
            controls.set_distance_bounds(trackball.min_distance, trackball.max_distance);
            controls.set_on_change(trackball.on_change.clone());
            Rc::new(RefCell::new(controls))
        });

        let resize = options
            .resize
            .enable
            .then(|| subscribe_resize(host, &container, &camera, &renderer));

        let picking = options.raycast.enable.then(|| Picking {
            pointer: Vector2::new(0.0, 0.0),
            raycaster: Raycaster::new(),
        });

        log::info!(
            "Created scene session {}x{} (controls: {}, resize: {}, raycast: {})",
            width,
            height,
            controls.is_some(),
            resize.is_some(),
            picking.is_some()
        );

        Ok(Self {
            state: Some(SessionState {
                container,
                scene,
                camera,
                renderer,
                controls,
                resize,
                picking,
            }),
        })
    }

    fn state(&self) -> Result<&SessionState<R>> {
        self.state.as_ref().ok_or(SessionError::InvalidSessionState)
    }

    fn state_mut(&mut self) -> Result<&mut SessionState<R>> {
        self.state.as_mut().ok_or(SessionError::InvalidSessionState)
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.is_none()
    }

    pub fn container(&self) -> Result<&Rc<R::Target>> {
        Ok(&self.state()?.container)
    }

    pub fn scene(&self) -> Result<&Scene> {
        Ok(&self.state()?.scene)
    }

    pub fn scene_mut(&mut self) -> Result<&mut Scene> {
        Ok(&mut self.state_mut()?.scene)
    }

    pub fn camera(&self) -> Result<&Rc<RefCell<PerspectiveCamera>>> {
        Ok(&self.state()?.camera)
    }

    pub fn renderer(&self) -> Result<&Rc<RefCell<R>>> {
        Ok(&self.state()?.renderer)
    }

    /// The orbit controls, when `trackball_control.enable` was set
    pub fn controls(&self) -> Result<Option<&Rc<RefCell<OrbitControls>>>> {
        Ok(self.state()?.controls.as_ref())
    }

    /// Draws the scene through the camera
    pub fn render(&self) -> Result<()> {
        let state = self.state()?;
        let camera = state.camera.borrow();
        state.renderer.borrow_mut().render(&state.scene, &camera)
    }

    /// Casts a ray through the pixel `(x, y)` of the container and intersects
    /// `candidates` and all their descendants.
    ///
    /// Pixel coordinates have their origin at the container's top-left corner.
    /// Hits come back nearest first; an empty result means nothing was hit.
    pub fn ray_pick(&mut self, x: f32, y: f32, candidates: &[ObjectId]) -> Result<Vec<Intersection>> {
        let state = self.state_mut()?;
        let picking = state.picking.as_mut().ok_or(SessionError::RaycastDisabled)?;

        let (width, height) = {
            let (width, height) = state.container.client_size();
            clamp_viewport(width, height)
        };
        write_pixel_to_ndc(&mut picking.pointer, x, y, width, height);
        picking
            .raycaster
            .set_from_camera(picking.pointer, &state.camera.borrow());

        picking.raycaster.intersect_objects(&state.scene, candidates, true)
    }

    /// [`ray_pick`](Self::ray_pick) against every top-level object in the scene
    pub fn ray_pick_scene(&mut self, x: f32, y: f32) -> Result<Vec<Intersection>> {
        let roots = self.scene()?.roots().to_vec();
        self.ray_pick(x, y, &roots)
    }

    /// Tears the session down. Safe to call more than once.
    pub fn destroy(&mut self) {
        let Some(state) = self.state.take() else {
            log::debug!("Scene session already destroyed");
            return;
        };

        if let Some(resize) = state.resize {
            resize.notifier.unsubscribe(resize.listener);
            if let Some(task) = resize.pending.take() {
                resize.tasks.cancel(task);
            }
        }

        if let Some(controls) = &state.controls {
            controls.borrow_mut().dispose();
        }
        state.renderer.borrow_mut().dispose();

        log::info!("Destroyed scene session");
    }
}

impl<R: Renderer> Drop for SceneSession<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Registers the debounced resize recompute
fn subscribe_resize<R: Renderer>(
    host: &Host,
    container: &Rc<R::Target>,
    camera: &Rc<RefCell<PerspectiveCamera>>,
    renderer: &Rc<RefCell<R>>,
) -> ResizeSubscription {
    let pending: Rc<Cell<Option<TaskId>>> = Rc::new(Cell::new(None));

    let listener = {
        let pending = pending.clone();
        let tasks = Rc::downgrade(host.task_queue());
        let container = Rc::downgrade(container);
        let camera = Rc::downgrade(camera);
        let renderer = Rc::downgrade(renderer);

        host.resize_notifier().subscribe(move || {
            let Some(tasks) = tasks.upgrade() else {
                return;
            };
            if let Some(previous) = pending.take() {
                tasks.cancel(previous);
            }

            let task = {
                let pending = pending.clone();
                let (container, camera, renderer) = (container.clone(), camera.clone(), renderer.clone());
                move || {
                    pending.set(None);
                    recompute_size(&container, &camera, &renderer);
                }
            };
            pending.set(Some(tasks.schedule(task)));
        })
    };

    ResizeSubscription {
        notifier: host.resize_notifier().clone(),
        tasks: host.task_queue().clone(),
        listener,
        pending,
    }
}

fn recompute_size<R: Renderer>(
    container: &Weak<R::Target>,
    camera: &Weak<RefCell<PerspectiveCamera>>,
    renderer: &Weak<RefCell<R>>,
) {
    let (Some(container), Some(camera), Some(renderer)) =
        (container.upgrade(), camera.upgrade(), renderer.upgrade())
    else {
        return;
    };

    let (width, height) = {
        let (width, height) = container.client_size();
        clamp_viewport(width, height)
    };
    log::debug!("Resizing scene session to {}x{}", width, height);

    camera.borrow_mut().resize_projection(width, height);
    renderer.borrow_mut().set_size(width, height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::{generate_cube, generate_sphere};
    use crate::gfx::rendering::HeadlessRenderer;
    use crate::gfx::scene::{Mesh, Object3D};
    use crate::host::MemoryContainer;
    use approx::assert_relative_eq;
    use cgmath::{InnerSpace, Vector3};

    type TestSession = SceneSession<HeadlessRenderer>;

    fn session_with(options: &SceneOptions) -> (Host, Rc<MemoryContainer>, TestSession) {
        let host = Host::new();
        let container = Rc::new(MemoryContainer::new(800, 600));
        let session = TestSession::create(&host, container.clone(), options).unwrap();
        (host, container, session)
    }

    #[test]
    fn test_default_session() {
        let (host, container, session) = session_with(&SceneOptions::default());

        let camera = session.camera().unwrap().borrow();
        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
        assert_eq!(camera.fovy.0, 75.0);
        assert_eq!(camera.znear, 0.1);
        assert_eq!(camera.zfar, 1000.0);
        assert_eq!(camera.position, Point3::new(100.0, 100.0, 100.0));
        assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));

        let renderer = session.renderer().unwrap().borrow();
        assert!(renderer.antialias());
        assert_eq!(renderer.size(), (800, 600));
        assert_eq!(renderer.frames_rendered(), 1);
        assert_eq!(container.surfaces(), vec![renderer.surface()]);

        assert!(session.controls().unwrap().is_none());
        assert_eq!(host.resize_notifier().listener_count(), 0);
        assert!(session.scene().unwrap().is_empty());
    }

    #[test]
    fn test_create_clears_previous_content() {
        let host = Host::new();
        let container = Rc::new(MemoryContainer::new(640, 480));

        let first = TestSession::create(&host, container.clone(), &SceneOptions::default()).unwrap();
        let second = TestSession::create(&host, container.clone(), &SceneOptions::default()).unwrap();

        let surface = second.renderer().unwrap().borrow().surface();
        assert_ne!(first.renderer().unwrap().borrow().surface(), surface);
        assert_eq!(container.surfaces(), vec![surface]);
    }

    #[test]
    fn test_custom_camera_position() {
        let options = SceneOptions::default().with_camera_position([0.0, 0.0, 250.0]);
        let (_host, _container, session) = session_with(&options);

        let camera = session.camera().unwrap().borrow();
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 250.0));
        assert_relative_eq!(camera.forward().z, -1.0);
    }

    #[test]
    fn test_zero_sized_container_is_clamped() {
        let host = Host::new();
        let container = Rc::new(MemoryContainer::new(0, 0));
        let session = TestSession::create(&host, container, &SceneOptions::default()).unwrap();

        assert_eq!(session.camera().unwrap().borrow().aspect, 1.0);
        assert_eq!(session.renderer().unwrap().borrow().size(), (1, 1));
    }

    #[test]
    fn test_trackball_controls() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let options = {
            let changes = changes.clone();
            SceneOptions::default()
                .with_trackball(150.0, 300.0)
                .on_control_change(move |change| changes.borrow_mut().push(*change))
        };
        let (_host, _container, session) = session_with(&options);

        let controls = session.controls().unwrap().unwrap();
        {
            let controls = controls.borrow();
            assert_eq!(controls.min_distance, 150.0);
            assert_eq!(controls.max_distance, 300.0);
            assert!(controls.has_change_listener());
        }

        controls.borrow_mut().zoom(10.0);
        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_relative_eq!(changes[0].distance, 300.0);

        // The controls move the session's own camera
        let camera = session.camera().unwrap().borrow();
        assert_eq!(camera.position, changes[0].position);
        assert_relative_eq!((camera.position - camera.target).magnitude(), 300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_trackball_without_listener() {
        let (_host, _container, session) = session_with(&SceneOptions::default().with_trackball(100.0, 400.0));
        let controls = session.controls().unwrap().unwrap();
        assert!(!controls.borrow().has_change_listener());
    }

    #[test]
    fn test_resize_burst_is_coalesced() {
        let (host, container, session) = session_with(&SceneOptions::default().with_resize());
        assert_eq!(host.resize_notifier().listener_count(), 1);

        container.set_size(1024, 512);
        host.notify_resize();
        host.notify_resize();
        host.notify_resize();
        assert_eq!(host.task_queue().pending_count(), 1);

        // Nothing changes until the next turn
        assert_eq!(session.renderer().unwrap().borrow().resize_count(), 0);

        container.set_size(1000, 500);
        assert_eq!(host.run_pending(), 1);

        let renderer = session.renderer().unwrap().borrow();
        assert_eq!(renderer.resize_count(), 1);
        assert_eq!(renderer.size(), (1000, 500));
        assert_eq!(session.camera().unwrap().borrow().aspect, 2.0);
    }

    #[test]
    fn test_resize_across_turns() {
        let (host, container, session) = session_with(&SceneOptions::default().with_resize());

        container.set_size(400, 400);
        host.notify_resize();
        host.run_pending();
        container.set_size(300, 600);
        host.notify_resize();
        host.run_pending();

        assert_eq!(session.renderer().unwrap().borrow().resize_count(), 2);
        assert_eq!(session.camera().unwrap().borrow().aspect, 0.5);
    }

    #[test]
    fn test_resize_disabled_ignores_notifications() {
        let (host, container, session) = session_with(&SceneOptions::default());

        container.set_size(200, 100);
        host.notify_resize();
        assert_eq!(host.run_pending(), 0);
        assert_eq!(session.renderer().unwrap().borrow().resize_count(), 0);
        assert_relative_eq!(session.camera().unwrap().borrow().aspect, 800.0 / 600.0);
    }

    #[test]
    fn test_destroy_detaches_resize() {
        let (host, container, mut session) = session_with(&SceneOptions::default().with_resize().with_trackball(100.0, 400.0));
        let renderer = session.renderer().unwrap().clone();
        let controls = session.controls().unwrap().unwrap().clone();

        container.set_size(1024, 512);
        host.notify_resize();
        session.destroy();

        assert_eq!(host.resize_notifier().listener_count(), 0);
        assert_eq!(host.task_queue().pending_count(), 0);
        host.notify_resize();
        assert_eq!(host.run_pending(), 0);

        assert!(renderer.borrow().is_disposed());
        assert_eq!(renderer.borrow().resize_count(), 0);
        assert!(controls.borrow().is_disposed());
        assert!(session.is_destroyed());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (_host, _container, mut session) = session_with(&SceneOptions::default());
        session.destroy();
        session.destroy();
        assert!(session.is_destroyed());
    }

    #[test]
    fn test_drop_destroys() {
        let (host, _container, session) = session_with(&SceneOptions::default().with_resize());
        let renderer = session.renderer().unwrap().clone();

        drop(session);
        assert_eq!(host.resize_notifier().listener_count(), 0);
        assert!(renderer.borrow().is_disposed());
    }

    #[test]
    fn test_use_after_destroy() {
        let (_host, _container, mut session) = session_with(&SceneOptions::default().with_raycast());
        session.destroy();

        assert!(matches!(session.scene(), Err(SessionError::InvalidSessionState)));
        assert!(matches!(session.camera(), Err(SessionError::InvalidSessionState)));
        assert!(matches!(session.render(), Err(SessionError::InvalidSessionState)));
        assert!(matches!(
            session.ray_pick(10.0, 10.0, &[]),
            Err(SessionError::InvalidSessionState)
        ));
    }

    #[test]
    fn test_ray_pick_requires_raycast() {
        let (_host, _container, mut session) = session_with(&SceneOptions::default());
        assert!(matches!(
            session.ray_pick(400.0, 300.0, &[]),
            Err(SessionError::RaycastDisabled)
        ));
    }

    #[test]
    fn test_ray_pick_empty_candidates() {
        let (_host, _container, mut session) = session_with(&SceneOptions::default().with_raycast());
        session.scene_mut().unwrap().add_geometry("cube", &generate_cube());
        assert!(session.ray_pick(400.0, 300.0, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_ray_pick_nearest_first() {
        let options = SceneOptions::default()
            .with_raycast()
            .with_camera_position([0.0, 0.0, 200.0]);
        let (_host, _container, mut session) = session_with(&options);

        let (far, near) = {
            let scene = session.scene_mut().unwrap();
            let mut far = Object3D::with_mesh("far", Mesh::from(&generate_cube()));
            far.set_transform_trs(Vector3::new(0.0, 2.0, -40.0), cgmath::Deg(0.0), 20.0);
            let mut near = Object3D::with_mesh("near", Mesh::from(&generate_sphere(10.0, 16, 8)));
            near.set_translation(Vector3::new(0.3, 0.2, 50.0));
            (scene.add(far), scene.add(near))
        };

        // One front face per object
        let hits = session.ray_pick(400.0, 300.0, &[far, near]).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, near);
        assert_relative_eq!(hits[0].distance, 140.0, epsilon = 0.5);
        assert_eq!(hits[1].object, far);
        assert_relative_eq!(hits[1].distance, 230.0, epsilon = 1e-3);

        // Results are independent values; a second pick does not disturb the first
        let again = session.ray_pick_scene(400.0, 300.0).unwrap();
        assert_eq!(again, hits);
        let missed = session.ray_pick(0.0, 0.0, &[far, near]).unwrap();
        assert!(missed.is_empty());
        assert_eq!(hits[0].object, near);
    }

    #[test]
    fn test_ray_pick_uses_current_container_size() {
        let options = SceneOptions::default()
            .with_raycast()
            .with_camera_position([0.0, 0.0, 200.0]);
        let (_host, container, mut session) = session_with(&options);
        let cube = {
            let mut cube = Object3D::with_mesh("cube", Mesh::from(&generate_cube()));
            cube.set_transform_trs(Vector3::new(0.0, 2.0, 0.0), cgmath::Deg(0.0), 20.0);
            session.scene_mut().unwrap().add(cube)
        };

        // Without a resize recompute the camera keeps its aspect; only the
        // pixel mapping follows the container
        container.set_size(400, 300);
        assert!(!session.ray_pick(200.0, 150.0, &[cube]).unwrap().is_empty());
        assert!(session.ray_pick(400.0, 300.0, &[cube]).unwrap().is_empty());
    }

    #[test]
    fn test_ray_pick_from_straight_above() {
        let options = SceneOptions::default()
            .with_raycast()
            .with_camera_position([0.0, 200.0, 0.0]);
        let (_host, _container, mut session) = session_with(&options);
        let cube = {
            let mut cube = Object3D::with_mesh("cube", Mesh::from(&generate_cube()));
            cube.set_transform_trs(Vector3::new(2.0, 0.0, 1.3), cgmath::Deg(0.0), 20.0);
            session.scene_mut().unwrap().add(cube)
        };

        let hits = session.ray_pick(400.0, 300.0, &[cube]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].distance, 190.0, epsilon = 1e-3);
        assert_relative_eq!(hits[0].point.y, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_render_counts_visible_meshes() {
        let (_host, _container, mut session) = session_with(&SceneOptions::default());
        session.scene_mut().unwrap().add_geometry("cube", &generate_cube());
        session.render().unwrap();

        let renderer = session.renderer().unwrap().borrow();
        assert_eq!(renderer.frames_rendered(), 2);
        assert_eq!(renderer.last_frame().unwrap().visible_meshes, 1);
    }
}
