//! Error types for scene sessions and their collaborators.

use thiserror::Error;

use crate::gfx::scene::ObjectId;

/// Errors produced by [`SceneSession`](crate::session::SceneSession) and the
/// modules it wires together.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was used after [`destroy`](crate::session::SceneSession::destroy).
    #[error("scene session has been destroyed and can no longer be used")]
    InvalidSessionState,

    /// `ray_pick` was called on a session created without `raycast.enable`.
    #[error("ray picking is not enabled for this session")]
    RaycastDisabled,

    /// Options could not be read or parsed.
    #[error("invalid scene options: {0}")]
    Config(String),

    /// The renderer could not be created or could not produce a frame.
    #[error("renderer error: {0}")]
    Renderer(String),

    /// An OBJ model could not be loaded into the scene.
    #[error("failed to load model: {0}")]
    ModelLoad(#[from] tobj::LoadError),

    /// The windowed app's event loop could not be created or run.
    #[error("event loop error: {0}")]
    EventLoop(String),

    /// The scene holds no object with this id.
    #[error("no object {0:?} in scene")]
    UnknownObject(ObjectId),
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<winit::error::EventLoopError> for SessionError {
    fn from(err: winit::error::EventLoopError) -> Self {
        SessionError::EventLoop(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
