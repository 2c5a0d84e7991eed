use std::{cell::RefCell, rc::Rc};

use cgmath::*;
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::perspective_camera::PerspectiveCamera;

/// Camera state reported to change subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlsChange {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub distance: f32,
}

pub type ChangeCallback = Rc<dyn Fn(&ControlsChange)>;

/// Orbit-style controls that rotate, zoom and pan a shared camera around a target.
///
/// The orbit distance is kept within `[min_distance, max_distance]` and pitch
/// stops just short of the poles. Every change repositions the camera, aims
/// it at the target and notifies the change subscriber, if one is set.
pub struct OrbitControls {
    camera: Rc<RefCell<PerspectiveCamera>>,
    target: Point3<f32>,
    distance: f32,
    pitch: f32,
    yaw: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    min_pitch: f32,
    max_pitch: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    on_change: Option<ChangeCallback>,
    initial: (Point3<f32>, Point3<f32>),
    is_mouse_pressed: bool,
    is_shift_held: bool,
    disposed: bool,
}

impl OrbitControls {
    /// Binds controls to `camera`, orbiting around the camera's current target
    pub fn new(camera: Rc<RefCell<PerspectiveCamera>>) -> Self {
        let (position, target) = {
            let camera = camera.borrow();
            (camera.position, camera.target)
        };

        let mut controls = Self {
            camera,
            target,
            distance: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_pitch: -std::f32::consts::FRAC_PI_2 + 1e-4,
            max_pitch: std::f32::consts::FRAC_PI_2 - 1e-4,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            pan_speed: 0.01,
            on_change: None,
            initial: (position, target),
            is_mouse_pressed: false,
            is_shift_held: false,
            disposed: false,
        };
        controls.sync_from_camera(position);
        controls
    }

    pub fn set_distance_bounds(&mut self, min_distance: f32, max_distance: f32) {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
    }

    pub fn set_on_change(&mut self, callback: Option<ChangeCallback>) {
        self.on_change = callback;
    }

    pub fn has_change_listener(&self) -> bool {
        self.on_change.is_some()
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance
            .min(self.max_distance)
            .max(self.min_distance.max(f32::EPSILON));
        self.update();
    }

    /// Scales the orbit distance; positive deltas move away from the target
    pub fn zoom(&mut self, delta: f32) {
        self.set_distance(self.distance * (1.0 + delta * self.zoom_speed));
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(self.min_pitch, self.max_pitch);
        self.update();
    }

    /// Moves camera and target together, in the camera's view plane
    pub fn pan(&mut self, delta: (f32, f32)) {
        let (_, right, up) = self.camera.borrow().view_basis();

        let pan_scale = self.distance * 0.1;
        self.target += (right * delta.0 + up * delta.1) * pan_scale;
        self.update();
    }

    /// Restores the camera position and target the controls were created with
    pub fn reset(&mut self) {
        let (position, target) = self.initial;
        self.target = target;
        self.sync_from_camera(position);
        self.update();
    }

    /// Applies winit device input. Returns true if the camera moved.
    pub fn process_event(&mut self, event: &DeviceEvent) -> bool {
        if self.disposed {
            return false;
        }

        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
                false
            }
            DeviceEvent::MouseWheel { delta } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 * 0.01
                    }
                };
                self.zoom(scroll_amount);
                true
            }
            DeviceEvent::MouseMotion { delta } if self.is_mouse_pressed => {
                if self.is_shift_held {
                    self.pan((
                        -delta.0 as f32 * self.pan_speed,
                        delta.1 as f32 * self.pan_speed,
                    ));
                } else {
                    self.rotate(
                        -delta.0 as f32 * self.rotate_speed,
                        delta.1 as f32 * self.rotate_speed,
                    );
                }
                true
            }
            _ => false,
        }
    }

    /// Tracks shift for panning; Shift+C resets the view. Returns true if the camera moved.
    pub fn process_key(&mut self, event: &KeyEvent) -> bool {
        if self.disposed {
            return false;
        }

        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
                false
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } if self.is_shift_held => {
                log::debug!("Resetting orbit controls to initial view");
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Releases the change subscriber and stops reacting to input
    pub fn dispose(&mut self) {
        self.on_change = None;
        self.is_mouse_pressed = false;
        self.disposed = true;
    }

    fn sync_from_camera(&mut self, position: Point3<f32>) {
        let offset = position - self.target;
        self.distance = offset.magnitude();
        if self.distance > 0.0 {
            self.pitch = (offset.y / self.distance)
                .asin()
                .clamp(self.min_pitch, self.max_pitch);
            self.yaw = offset.x.atan2(offset.z);
        }
    }

    /// Repositions the camera after changing distance, pitch, yaw or target.
    fn update(&mut self) {
        if self.disposed {
            return;
        }

        let position = Point3::from_vec(calculate_cartesian_eye_position(
            self.pitch,
            self.yaw,
            self.distance,
            self.target.to_vec(),
        ));
        {
            let mut camera = self.camera.borrow_mut();
            camera.position = position;
            camera.look_at(self.target);
        }

        if let Some(on_change) = &self.on_change {
            on_change(&ControlsChange {
                position,
                target: self.target,
                distance: self.distance,
            });
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}
