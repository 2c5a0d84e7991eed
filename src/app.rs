use std::{rc::Rc, sync::Arc};

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::SceneOptions;
use crate::error::{Result, SessionError};
use crate::gfx::picking::Intersection;
use crate::gfx::rendering::RenderEngine;
use crate::gfx::scene::Scene;
use crate::host::{Host, WindowContainer};
use crate::session::SceneSession;

/// Populates the scene once the session exists
pub type SetupCallback = Box<dyn FnOnce(&mut Scene) -> Result<()>>;

/// Receives the hits of a left click, nearest first
pub type PickCallback = Box<dyn FnMut(&Scene, &[Intersection])>;

/// A window running one [`SceneSession`].
///
/// The app owns the winit event loop and plays the host's part for the
/// session: window resizes go to the resize notifier, the task queue is
/// drained once per loop turn, device input drives the orbit controls and
/// left clicks are ray-picked when `raycast.enable` is set.
pub struct QuickSceneApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    title: String,
    options: SceneOptions,
    host: Host,
    window: Option<Arc<Window>>,
    session: Option<SceneSession<RenderEngine>>,
    setup: Option<SetupCallback>,
    on_pick: Option<PickCallback>,
    cursor: Option<PhysicalPosition<f64>>,
    error: Option<SessionError>,
}

impl QuickSceneApp {
    pub fn new(options: SceneOptions) -> Result<Self> {
        let event_loop = EventLoop::new()?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                title: "quickscene".to_string(),
                options,
                host: Host::new(),
                window: None,
                session: None,
                setup: None,
                on_pick: None,
                cursor: None,
                error: None,
            },
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.app_state.title = title.into();
        self
    }

    /// Set the scene setup callback, run once after the window opens
    pub fn set_setup<F>(&mut self, setup: F)
    where
        F: FnOnce(&mut Scene) -> Result<()> + 'static,
    {
        self.app_state.setup = Some(Box::new(setup));
    }

    /// Set the pick callback. Only called when ray picking is enabled.
    pub fn set_on_pick<F>(&mut self, on_pick: F)
    where
        F: FnMut(&Scene, &[Intersection]) + 'static,
    {
        self.app_state.on_pick = Some(Box::new(on_pick));
    }

    /// Run the application (consumes self and starts the event loop)
    ///
    /// Returns the first session error that stopped the loop, if any.
    pub fn run(mut self) -> Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            return Err(SessionError::InvalidSessionState);
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: SessionError) {
        log::error!("{}", err);
        if let Some(session) = self.session.as_mut() {
            session.destroy();
        }
        if self.error.is_none() {
            self.error = Some(err);
        }
        event_loop.exit();
    }

    fn open_session(&mut self, window: Arc<Window>) -> Result<SceneSession<RenderEngine>> {
        let container = Rc::new(WindowContainer::new(window));
        let mut session = crate::quick_scene(&self.host, container, &self.options)?;

        if let Some(setup) = self.setup.take() {
            setup(session.scene_mut()?)?;
            log::info!("Scene ready: {:?}", session.scene()?.get_statistics());
        }
        Ok(session)
    }

    fn pick(&mut self) -> Result<()> {
        let (Some(session), Some(cursor)) = (self.session.as_mut(), self.cursor) else {
            return Ok(());
        };
        if !self.options.raycast.enable {
            return Ok(());
        }

        let hits = session.ray_pick_scene(cursor.x as f32, cursor.y as f32)?;
        log::debug!("Picked {} intersections at {:?}", hits.len(), cursor);
        if let Some(on_pick) = self.on_pick.as_mut() {
            on_pick(session.scene()?, &hits);
        }
        Ok(())
    }

    fn process_key(&mut self, event: &KeyEvent) -> Result<bool> {
        let Some(session) = self.session.as_ref() else {
            return Ok(false);
        };
        Ok(match session.controls()? {
            Some(controls) => controls.borrow_mut().process_key(event),
            None => false,
        })
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title(self.title.clone())
                .with_inner_size(LogicalSize::new(1200, 800)),
        ) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, SessionError::Renderer(e.to_string()));
                return;
            }
        };
        self.window = Some(window.clone());

        match self.open_session(window) {
            Ok(session) => self.session = Some(session),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.session.as_ref().is_none_or(|session| session.is_destroyed()) {
            return;
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if matches!(
                    event,
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    }
                ) {
                    if let Some(session) = self.session.as_mut() {
                        session.destroy();
                    }
                    event_loop.exit();
                    return;
                }
                if let Err(e) = self.process_key(&event) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::Resized(_) => {
                // The session reads the new size from the window on the next turn
                self.host.notify_resize();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Err(e) = self.pick() {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::CloseRequested => {
                if let Some(session) = self.session.as_mut() {
                    session.destroy();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let result = match self.session.as_ref() {
                    Some(session) if !session.is_destroyed() => session.render(),
                    _ => Ok(()),
                };
                if let Err(e) = result {
                    self.fail(event_loop, e);
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        if let Ok(Some(controls)) = session.controls() {
            controls.borrow_mut().process_event(&event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let ran = self.host.run_pending();
        if ran > 0 {
            log::debug!("Ran {} deferred tasks", ran);
        }

        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
