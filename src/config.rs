//! # Scene Options
//!
//! Options accepted by [`quick_scene`](crate::quick_scene). Every group and
//! every key inside a group falls back to its default when absent, so a user
//! configuration only has to name what it changes:
//!
//! ```toml
//! [camera]
//! position = [0.0, 50.0, 200.0]
//!
//! [trackballControl]
//! enabled = true
//! maxDistance = 600.0
//! ```
//!
//! Unknown keys are ignored. Both the snake_case names used by the Rust API
//! and the camelCase names of older option files are accepted.

use std::{fmt, path::Path, rc::Rc};

use serde::Deserialize;

use crate::error::Result;
use crate::gfx::camera::orbit_controls::{ChangeCallback, ControlsChange};

/// Top-level session configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    pub camera: CameraOptions,
    #[serde(alias = "trackballControl")]
    pub trackball_control: TrackballOptions,
    pub resize: ResizeOptions,
    pub raycast: RaycastOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Initial camera position; the camera always looks at the origin
    pub position: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: [100.0, 100.0, 100.0],
        }
    }
}

/// Orbit-style camera controls
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TrackballOptions {
    #[serde(alias = "enabled")]
    pub enable: bool,
    #[serde(alias = "maxDistance")]
    pub max_distance: f32,
    #[serde(alias = "minDistance")]
    pub min_distance: f32,
    /// Invoked after every camera change caused by the controls
    #[serde(skip)]
    pub on_change: Option<ChangeCallback>,
}

impl Default for TrackballOptions {
    fn default() -> Self {
        Self {
            enable: false,
            max_distance: 400.0,
            min_distance: 100.0,
            on_change: None,
        }
    }
}

impl fmt::Debug for TrackballOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackballOptions")
            .field("enable", &self.enable)
            .field("max_distance", &self.max_distance)
            .field("min_distance", &self.min_distance)
            .field("on_change", &self.on_change.as_ref().map(|_| "Fn(&ControlsChange)"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResizeOptions {
    #[serde(alias = "enabled")]
    pub enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaycastOptions {
    #[serde(alias = "enabled")]
    pub enable: bool,
    /// Event names a host may bind picking to. Carried for hosts; the session
    /// itself does not read it.
    pub events: Vec<String>,
}

impl SceneOptions {
    /// Parses options from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML options file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn with_camera_position(mut self, position: [f32; 3]) -> Self {
        self.camera.position = position;
        self
    }

    /// Enables the orbit controls with the given distance bounds
    pub fn with_trackball(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.trackball_control.enable = true;
        self.trackball_control.min_distance = min_distance;
        self.trackball_control.max_distance = max_distance;
        self
    }

    /// Subscribes `callback` to the controls' change notifications
    pub fn on_control_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ControlsChange) + 'static,
    {
        self.trackball_control.on_change = Some(Rc::new(callback));
        self
    }

    pub fn with_resize(mut self) -> Self {
        self.resize.enable = true;
        self
    }

    pub fn with_raycast(mut self) -> Self {
        self.raycast.enable = true;
        self
    }
}
